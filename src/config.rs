//! # Configuration Module
//!
//! Environment-provided settings for the bot: credentials, the record store,
//! the generation service, delivery mode and the bounds applied to every
//! external call. A `.env` file is honoured through `dotenv` in `main`.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// Defaults
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BREAKER_THRESHOLD: u32 = 5;
pub const DEFAULT_BREAKER_RESET_SECS: u64 = 60;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Bounds applied to external calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Upper bound for each record store call
    pub store: Duration,
    /// Upper bound for each generation call
    pub generation: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            generation: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

/// Circuit breaker settings for the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// How long the breaker stays open
    pub reset_after: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_BREAKER_THRESHOLD,
            reset_after: Duration::from_secs(DEFAULT_BREAKER_RESET_SECS),
        }
    }
}

/// Gemini settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// API key; free-text generation is disabled without one
    pub api_key: Option<String>,
    pub model: String,
    pub breaker: BreakerConfig,
}

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    Polling,
    Webhook { host: String, port: u16 },
}

impl DeliveryMode {
    /// Path Telegram posts updates to
    pub fn webhook_path(bot_token: &str) -> String {
        format!("/webhook/{bot_token}")
    }

    /// Address the webhook server listens on
    pub fn listen_addr(port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Complete bot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bot_token: String,
    /// PostgreSQL URL; the in-memory store is used without one
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub generation: GenerationConfig,
    pub delivery: DeliveryMode,
    pub timeouts: TimeoutConfig,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let delivery = match get("WEBHOOK_HOST") {
            Some(host) => DeliveryMode::Webhook {
                host: host.trim_end_matches('/').to_string(),
                port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            },
            None => DeliveryMode::Polling,
        };

        let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Text,
            Some(value) if value == "text" => LogFormat::Text,
            Some(value) if value == "json" => LogFormat::Json,
            Some(value) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value,
                })
            }
        };

        Ok(Self {
            bot_token,
            database_url: get("DATABASE_URL"),
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            generation: GenerationConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                breaker: BreakerConfig {
                    failure_threshold: parse_or(
                        "GENERATION_BREAKER_THRESHOLD",
                        get("GENERATION_BREAKER_THRESHOLD"),
                        DEFAULT_BREAKER_THRESHOLD,
                    )?,
                    reset_after: Duration::from_secs(parse_or(
                        "GENERATION_BREAKER_RESET_SECS",
                        get("GENERATION_BREAKER_RESET_SECS"),
                        DEFAULT_BREAKER_RESET_SECS,
                    )?),
                },
            },
            delivery,
            timeouts: TimeoutConfig {
                store: Duration::from_secs(parse_or(
                    "STORE_TIMEOUT_SECS",
                    get("STORE_TIMEOUT_SECS"),
                    DEFAULT_STORE_TIMEOUT_SECS,
                )?),
                generation: Duration::from_secs(parse_or(
                    "GENERATION_TIMEOUT_SECS",
                    get("GENERATION_TIMEOUT_SECS"),
                    DEFAULT_GENERATION_TIMEOUT_SECS,
                )?),
            },
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
