use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DB_PATH: &str = "db.sqlite";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bot token. `Bot::from_env` reads the same variable.
    pub bot_token: String,
    /// Base URL of the catalog and classification service.
    pub api_url: String,
    /// Dialogue storage.
    pub db_path: String,
    /// Bound on every request to the service.
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("TELOXIDE_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let http_timeout = match lookup("CRAB_HTTP_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CRAB_HTTP_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            bot_token,
            api_url: lookup("CRAB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            db_path: lookup("CRAB_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            http_timeout,
        })
    }
}
