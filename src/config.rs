use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is not a valid number: {value}")]
    InvalidNumber { key: &'static str, value: String },
}

// Runtime settings, read once at start-up
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub server_address: String,
    pub frontend_server_url: String,
    pub email_sender: String,
    pub app_name: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. `DATABASE_URL` wins over
    /// the individual `DB_*` parts when both are present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => url,
            None => {
                let user = lookup("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".into());
                let port = lookup("DB_PORT").unwrap_or_else(|| "3306".into());
                let name = lookup("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;
                format!("mysql://{}:{}@{}:{}/{}", user, password, host, port, name)
            }
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber { key: "DB_MAX_CONNECTIONS", value })?,
            None => 5,
        };

        Ok(Settings {
            database_url,
            max_connections,
            server_address: lookup("SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            frontend_server_url: lookup("FRONTEND_SERVER_URL").unwrap_or_default(),
            email_sender: lookup("EMAIL_SENDER").unwrap_or_else(|| "no-reply@localhost".into()),
            app_name: lookup("APP_NAME").unwrap_or_else(|| "GRC".into()),
        })
    }
}
