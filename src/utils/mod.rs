pub mod config;
pub mod errors;
pub mod security;

pub use config::AppConfig;
pub use errors::ApiError;
