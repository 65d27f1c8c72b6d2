//! Engine configuration.
//!
//! Values default to settings suitable for tests and local development and
//! can be overridden from the environment:
//!
//! | Variable                          | Meaning                                  |
//! |-----------------------------------|------------------------------------------|
//! | `TASKLINK_TRANSACTION_TIMEOUT_MS` | Unit-of-work deadline; `0` disables it   |
//! | `TASKLINK_DATABASE_URL`           | `PostgreSQL` connection URL              |
//! | `TASKLINK_DB_POOL_SIZE`           | Maximum pooled `PostgreSQL` connections  |

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the unit-of-work deadline in milliseconds.
pub const TRANSACTION_TIMEOUT_ENV: &str = "TASKLINK_TRANSACTION_TIMEOUT_MS";
/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_ENV: &str = "TASKLINK_DATABASE_URL";
/// Environment variable holding the `PostgreSQL` pool size.
pub const DB_POOL_SIZE_ENV: &str = "TASKLINK_DB_POOL_SIZE";

const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POOL_SIZE: u32 = 10;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value that does not parse.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// Parse failure description.
        reason: String,
    },
}

/// Settings for units of work run by the transaction orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Maximum wall-clock time a unit of work may spend before its next
    /// store access aborts it. `None` disables the deadline.
    pub timeout: Option<Duration>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TRANSACTION_TIMEOUT),
        }
    }
}

impl TransactionConfig {
    /// Returns a configuration without a deadline.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { timeout: None }
    }

    /// Returns a configuration with the given deadline.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL, empty when no database is configured.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Unit-of-work settings.
    pub transaction: TransactionConfig,
    /// Database settings for the `PostgreSQL` store.
    pub database: DatabaseConfig,
}

impl EngineConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set but does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(TRANSACTION_TIMEOUT_ENV) {
            let millis = parse_number::<u64>(TRANSACTION_TIMEOUT_ENV, &raw)?;
            config.transaction.timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            config.database.url = url;
        }
        if let Some(raw) = lookup(DB_POOL_SIZE_ENV) {
            config.database.max_pool_size = parse_number::<u32>(DB_POOL_SIZE_ENV, &raw)?;
        }

        Ok(config)
    }
}

fn parse_number<N>(key: &'static str, raw: &str) -> Result<N, ConfigError>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<N>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: raw.to_owned(),
            reason: err.to_string(),
        })
}
