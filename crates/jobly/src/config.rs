//! Process-wide configuration.
//!
//! [`AppConfig`] is built once at startup and passed by reference to the
//! pieces that need it. [`AppConfig::from_env`] is the only place that reads
//! the process environment.

use crate::error::{JoblyError, JoblyResult};
use std::time::Duration;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const TOKEN_TTL_SECS: &str = "TOKEN_TTL_SECS";
pub const DB_POOL_MAX_SIZE: &str = "DB_POOL_MAX_SIZE";

/// Configuration for the store connection and token signing.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing and verifying tokens.
    pub secret_key: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Maximum pooled connections.
    pub pool_max_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/jobly".to_string(),
            secret_key: "secret-dev".to_string(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            pool_max_size: 16,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the environment, reading a `.env` file first if present.
    pub fn from_env() -> JoblyResult<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        tracing::info!(
            target: "jobly.config",
            pool_max_size = config.pool_max_size,
            token_ttl_secs = config.token_ttl.as_secs(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL) {
            config.database_url = url;
        }
        if let Some(secret) = lookup(SECRET_KEY) {
            if secret.is_empty() {
                return Err(JoblyError::Config(format!("{SECRET_KEY} must not be empty")));
            }
            config.secret_key = secret;
        }
        if let Some(raw) = lookup(TOKEN_TTL_SECS) {
            config.token_ttl = Duration::from_secs(parse_number(TOKEN_TTL_SECS, &raw)?);
        }
        if let Some(raw) = lookup(DB_POOL_MAX_SIZE) {
            config.pool_max_size = parse_number(DB_POOL_MAX_SIZE, &raw)?;
        }
        Ok(config)
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn secret_key(mut self, secret: impl Into<String>) -> Self {
        self.secret_key = secret.into();
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn pool_max_size(mut self, size: usize) -> Self {
        self.pool_max_size = size;
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> JoblyResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| JoblyError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}
