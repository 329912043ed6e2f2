//! Service configuration
//!
//! Built once at startup from an optional TOML file, then overridden by
//! environment variables (a `.env` file is loaded first if present). Every
//! field has a default, so an empty file is a valid configuration.

use serde::Deserialize;
use std::path::Path;
use storekeep_core::errors::{ExError, ExErrorKind, Result};
use storekeep_core::logging_facility::Profile;
use storekeep_store::{DatabaseConfig, RetryPolicy};

pub const ENV_DB_PATH: &str = "STOREKEEP_DB_PATH";
pub const ENV_WORKERS: &str = "STOREKEEP_WORKERS";
pub const ENV_POOL_SIZE: &str = "STOREKEEP_POOL_SIZE";
pub const ENV_APP_ENV: &str = "APP_ENV";

/// Worker pool and redelivery settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// Redeliveries allowed for a conflicting message before it is rejected
    pub max_redeliveries: u32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            max_redeliveries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Development.as_str().to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn profile(&self) -> Result<Profile> {
        self.profile.parse::<Profile>().map_err(|e| config_error(e))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub retry: RetryPolicy,
    pub consumer: ConsumerConfig,
    pub logging: LoggingConfig,
}

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| config_error(format!("{} must be a positive integer, got '{}'", name, raw)))
}

impl ServiceConfig {
    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| config_error(e.to_string()))
    }

    /// Load, apply environment overrides and validate
    ///
    /// # Errors
    ///
    /// `Config` when the file cannot be read or parsed, an override is not a
    /// number, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    config_error(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from variables resolved through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = path.into();
        }
        if let Some(raw) = lookup(ENV_POOL_SIZE) {
            self.database.pool_size = parse_number(ENV_POOL_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            self.consumer.workers = parse_number(ENV_WORKERS, &raw)?;
        }
        if let Some(app_env) = lookup(ENV_APP_ENV) {
            self.logging.profile = Profile::from_app_env(&app_env).as_str().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(config_error("database.pool_size must be at least 1"));
        }
        if self.consumer.workers == 0 {
            return Err(config_error("consumer.workers must be at least 1"));
        }
        if self.consumer.queue_capacity == 0 {
            return Err(config_error("consumer.queue_capacity must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(config_error("retry.max_attempts must be at least 1"));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(config_error(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        self.logging.profile()?;
        Ok(())
    }
}
