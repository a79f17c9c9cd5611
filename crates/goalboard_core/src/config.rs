//! Runtime configuration.
//!
//! # Responsibility
//! - Collect store, logging and suggestion settings from the environment.
//! - Decide which store backend is constructed at startup.
//!
//! # Invariants
//! - Empty environment values behave like unset ones.
//! - Invalid values are reported, never silently replaced by defaults.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "GOALBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "GOALBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GOALBOARD_LOG_DIR";
pub const ENV_SUGGEST_TIMEOUT_MS: &str = "GOALBOARD_SUGGEST_TIMEOUT_MS";

/// Upper bound on waiting for the external suggestion provider.
pub const DEFAULT_SUGGEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidTimeout { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidTimeout { key, value } => write!(
                f,
                "{key} must be a positive number of milliseconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Process-wide settings resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file for the durable store. `None` selects the in-memory store.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Directory for rolling log files. `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
    pub suggest_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            suggest_timeout: DEFAULT_SUGGEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, defaulting unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        config.database_path = value(ENV_DB_PATH).map(PathBuf::from);
        config.log_dir = value(ENV_LOG_DIR).map(PathBuf::from);

        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)
                .map_err(ConfigError::InvalidLogLevel)?
                .to_string();
        }

        if let Some(raw) = value(ENV_SUGGEST_TIMEOUT_MS) {
            config.suggest_timeout = parse_timeout_ms(ENV_SUGGEST_TIMEOUT_MS, &raw)?;
        }

        Ok(config)
    }

    /// Returns whether the durable SQLite store will be used.
    pub fn uses_durable_store(&self) -> bool {
        self.database_path.is_some()
    }
}

fn parse_timeout_ms(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidTimeout {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_select_memory_store() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(!config.uses_durable_store());
        assert_eq!(config.suggest_timeout, DEFAULT_SUGGEST_TIMEOUT);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn reads_all_keys_and_ignores_blank_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/goalboard/goals.sqlite3"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, "   "),
            (ENV_SUGGEST_TIMEOUT_MS, "2500"),
        ]))
        .unwrap();

        assert!(config.uses_durable_store());
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.suggest_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_invalid_values() {
        let zero = AppConfig::from_lookup(lookup_from(&[(ENV_SUGGEST_TIMEOUT_MS, "0")]));
        assert!(matches!(zero, Err(ConfigError::InvalidTimeout { .. })));

        let level = AppConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "loud")]));
        assert!(matches!(level, Err(ConfigError::InvalidLogLevel(_))));
    }
}
