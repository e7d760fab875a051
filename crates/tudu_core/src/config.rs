//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect logging and storage settings from the environment or a JSON
//!   document supplied by an embedding host.
//!
//! # Invariants
//! - Every field has a default; an empty source yields a usable config.
//! - `log_level` is normalized on load; unknown levels are rejected.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "TUDU_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TUDU_LOG_DIR";
pub const ENV_DB_PATH: &str = "TUDU_DB_PATH";

/// Settings for logging and the local document store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling logs. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// SQLite document store file. `None` keeps documents in memory.
    pub db_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
        }
    }
}

impl CoreConfig {
    /// Reads `TUDU_LOG_LEVEL`, `TUDU_LOG_DIR` and `TUDU_DB_PATH`.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses a JSON object such as `{"log_level": "warn", "db_path": "/data/tudu.db"}`.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| format!("invalid core config: {err}"))?;
        config.normalized()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        config.db_path = read(ENV_DB_PATH).map(PathBuf::from);
        config.normalized()
    }

    fn normalized(mut self) -> Result<Self, String> {
        self.log_level = normalize_level(&self.log_level)?.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn empty_sources_yield_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.log_level, default_log_level());

        assert_eq!(CoreConfig::from_json_str("{}").unwrap(), CoreConfig::default());
    }

    #[test]
    fn lookup_values_are_trimmed_and_normalized() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(ENV_LOG_LEVEL, " WARNING "), (ENV_DB_PATH, "/tmp/tudu.db")]);
        let config =
            CoreConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string())).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/tudu.db")));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn json_rejects_unknown_level_and_fields() {
        assert!(CoreConfig::from_json_str(r#"{"log_level": "loud"}"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{"colour": true}"#).is_err());
    }
}
