//! Application settings, read from the environment (and an optional `.env` file).

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://chatbot.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CHATBOT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{0}` must be set")]
    Missing(&'static str),
    #[error("`{name}` has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub chatbot: ChatbotSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_address: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct ChatbotSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for ChatbotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbotSettings")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    /// Loads `.env` (if present) and reads settings from the process environment.
    pub fn from_env() -> Result<Settings, ConfigError> {
        dotenvy::dotenv().ok();
        Settings::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_address = get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned());
        let bind_address = parse("BIND_ADDRESS", bind_address)?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_owned())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse("DATABASE_MAX_CONNECTIONS", value)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let timeout_ms = match get("CHATBOT_API_TIMEOUT_MS") {
            Some(value) => match parse::<u64>("CHATBOT_API_TIMEOUT_MS", value.clone())? {
                0 => {
                    return Err(ConfigError::Invalid {
                        name: "CHATBOT_API_TIMEOUT_MS",
                        value,
                        reason: "must be greater than zero".to_owned(),
                    });
                }
                timeout_ms => timeout_ms,
            },
            None => DEFAULT_CHATBOT_TIMEOUT_MS,
        };

        Ok(Settings {
            server: ServerSettings {
                bind_address,
                cors_allowed_origins,
            },
            database: DatabaseSettings {
                url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
                max_connections,
            },
            chatbot: ChatbotSettings {
                url: get("CHATBOT_API_URL").ok_or(ConfigError::Missing("CHATBOT_API_URL"))?,
                api_key: get("CHATBOT_API_KEY"),
                timeout: Duration::from_millis(timeout_ms),
            },
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}
