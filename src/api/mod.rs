pub mod handlers;
pub mod multipart;
pub mod query;
pub mod state;
pub mod views;
