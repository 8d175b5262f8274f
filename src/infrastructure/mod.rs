pub mod database;
pub mod memory;
pub mod mongodb;
pub mod smtp;
pub mod uploads;

pub use database::mongo_context;
pub use smtp::email_service;
