use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub server: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub jwt_expiration_minutes: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub frontend_url: String,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {

    /// Loads the configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let smtp = match (var("SMTP_SERVER"), var("SMTP_USERNAME"), var("SMTP_PASSWORD")) {
            (Some(server), Some(username), Some(password)) => Some(SmtpSettings { server, username, password }),
            (None, None, None) => None,
            (None, _, _) => return Err(ConfigError::Missing("SMTP_SERVER")),
            (_, None, _) => return Err(ConfigError::Missing("SMTP_USERNAME")),
            (_, _, None) => return Err(ConfigError::Missing("SMTP_PASSWORD")),
        };

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_name: var("DATABASE_NAME").unwrap_or_else(|| "adopciones".to_string()),
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", var("PORT"), 8080)?,
            secret_key: required("SECRET_KEY")?,
            jwt_expiration_minutes: parse_or("JWT_EXPIRATION_MINUTES", var("JWT_EXPIRATION_MINUTES"), 60)?,
            bcrypt_cost: parse_or("BCRYPT_COST", var("BCRYPT_COST"), bcrypt::DEFAULT_COST)?,
            upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            frontend_url: var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            smtp,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
