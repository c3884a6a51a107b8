//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (`sqlite://...`, `sqlite::memory:`) or a plain file path
    pub database_url: String,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Page size used when a listing request does not give one
    pub default_page_size: u32,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "./data/students.db".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
            default_page_size: 25,
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and then read the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = lookup("DATABASE_PATH")
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or(defaults.database_url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.trim().parse().context("Invalid DATABASE_MAX_CONNECTIONS")?,
            None => defaults.max_connections,
        };

        let acquire_timeout = match lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .context("Invalid DATABASE_ACQUIRE_TIMEOUT_SECS")?,
            ),
            None => defaults.acquire_timeout,
        };

        let default_page_size: u32 = match lookup("DEFAULT_PAGE_SIZE") {
            Some(v) => v.trim().parse().context("Invalid DEFAULT_PAGE_SIZE")?,
            None => defaults.default_page_size,
        };
        if default_page_size == 0 {
            bail!("DEFAULT_PAGE_SIZE must be at least 1");
        }

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => defaults.log_format,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            Some(other) => bail!("Invalid LOG_FORMAT '{}': expected json or pretty", other),
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
            default_page_size,
            log_format,
        })
    }
}
