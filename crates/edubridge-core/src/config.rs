//! Configuration
//!
//! Loaded from TOML; every section has defaults so an empty file is valid.
//! `DATABASE_URL` from the environment (or a `.env` file) overrides
//! `database.url`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EduBridgeConfig {
    /// Record store connection
    pub database: DatabaseConfig,
    /// Catalog cache
    pub cache: CacheConfig,
    /// Session booking rules
    pub booking: BookingConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Record store connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres URL; empty selects the in-memory store
    pub url: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

/// Catalog cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Catalog rows held across all cached tables
    pub max_capacity: u64,
    /// Seconds before a cached table is reloaded; 0 disables expiry
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// TTL as a duration, `None` when expiry is disabled
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_secs: 300,
        }
    }
}

/// Session booking rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Used when a form leaves the duration unset
    pub default_duration_minutes: u32,
    /// Accepted session lengths in minutes
    pub allowed_durations: Vec<u32>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 60,
            allowed_durations: vec![30, 60, 90, 120],
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EduBridgeConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database URL
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database.url = url.into();
        self
    }

    /// Set catalog cache TTL in seconds
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache.ttl_secs = ttl_secs;
        self
    }

    /// Set allowed session durations
    #[must_use]
    pub fn with_allowed_durations(mut self, durations: impl Into<Vec<u32>>) -> Self {
        self.booking.allowed_durations = durations.into();
        self
    }

    /// Parse and validate TOML
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `DATABASE_URL`, reading `.env` first when present
    pub fn apply_env(&mut self) {
        dotenvy::dotenv().ok();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.booking.allowed_durations.is_empty() {
            return Err(ConfigError::Invalid(
                "booking.allowed_durations must not be empty".into(),
            ));
        }
        if !self
            .booking
            .allowed_durations
            .contains(&self.booking.default_duration_minutes)
        {
            return Err(ConfigError::Invalid(format!(
                "booking.default_duration_minutes {} is not in allowed_durations",
                self.booking.default_duration_minutes
            )));
        }
        Ok(())
    }

    /// Whether a Postgres URL is configured
    #[inline]
    #[must_use]
    pub fn uses_database(&self) -> bool {
        !self.database.url.trim().is_empty()
    }
}
