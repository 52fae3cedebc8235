//! Environment-driven application configuration.
//!
//! # Responsibility
//! - Resolve storage backend, logging, variant switches and remote sync
//!   settings from `STORYCARDS_*` variables.
//! - Reject malformed values with the offending key named.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Remote sync is off unless `STORYCARDS_SYNC_ENABLED` is truthy.

use crate::app::AppSettings;
use crate::logging::default_log_level;
use crate::model::card::PlaceholderPolicy;
use crate::sync::github::GithubTarget;
use crate::sync::worker::DEFAULT_DEBOUNCE;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "STORYCARDS_";
pub const DEFAULT_DB_FILE_NAME: &str = "storycards.sqlite3";
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for {key}; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

/// Where the serialized store is kept locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite(PathBuf),
    JsonFile(PathBuf),
    Memory,
}

/// Remote sync settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub target: GithubTarget,
    pub token: Option<String>,
    pub debounce: Duration,
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target: GithubTarget::default(),
            token: None,
            debounce: DEFAULT_DEBOUNCE,
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub settings: AppSettings,
    pub sync: Option<SyncConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Sqlite(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: default_log_level().to_string(),
            log_dir: None,
            settings: AppSettings::default(),
            sync: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, keyed by full variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup: &lookup };
        let mut config = Self::default();

        if vars.flag("MEMORY_ONLY")?.unwrap_or(false) {
            config.storage = StorageBackend::Memory;
        } else if let Some(path) = vars.text("STORE_FILE") {
            config.storage = StorageBackend::JsonFile(PathBuf::from(path));
        } else if let Some(path) = vars.text("DB_PATH") {
            config.storage = StorageBackend::Sqlite(PathBuf::from(path));
        }

        if let Some(level) = vars.text("LOG_LEVEL") {
            config.log_level = level;
        }
        config.log_dir = vars.text("LOG_DIR").map(PathBuf::from);

        if let Some(confirm) = vars.flag("CONFIRM_CARD_DELETE")? {
            config.settings.confirm_card_delete = confirm;
        }
        if let Some(policy) = vars.text("PLACEHOLDER") {
            config.settings.placeholder_policy = parse_placeholder_policy(&policy)
                .ok_or_else(|| vars.invalid("PLACEHOLDER", &policy, "deferred|eager"))?;
        }

        if vars.flag("SYNC_ENABLED")?.unwrap_or(false) {
            let mut sync = SyncConfig::default();
            if let Some(value) = vars.text("SYNC_API_BASE") {
                sync.target.api_base = value;
            }
            if let Some(value) = vars.text("SYNC_OWNER") {
                sync.target.owner = value;
            }
            if let Some(value) = vars.text("SYNC_REPO") {
                sync.target.repo = value;
            }
            if let Some(value) = vars.text("SYNC_PATH") {
                sync.target.path = value;
            }
            if let Some(value) = vars.text("SYNC_BRANCH") {
                sync.target.branch = value;
            }
            sync.token = vars.text("SYNC_TOKEN");
            if let Some(ms) = vars.number("SYNC_DEBOUNCE_MS")? {
                sync.debounce = Duration::from_millis(ms);
            }
            if let Some(secs) = vars.number("SYNC_TIMEOUT_SECS")? {
                sync.timeout = Duration::from_secs(secs.max(1));
            }
            config.sync = Some(sync);
        }

        Ok(config)
    }
}

/// Parses `deferred` or `eager`, case-insensitively.
pub fn parse_placeholder_policy(value: &str) -> Option<PlaceholderPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "deferred" => Some(PlaceholderPolicy::Deferred),
        "eager" => Some(PlaceholderPolicy::Eager),
        _ => None,
    }
}

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
    fn text(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}{name}"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.text(name) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(self.invalid(name, &value, "true|false")),
        }
    }

    fn number(&self, name: &str) -> Result<Option<u64>, ConfigError> {
        let Some(value) = self.text(name) else {
            return Ok(None);
        };
        value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| self.invalid(name, &value, "a non-negative integer"))
    }

    fn invalid(&self, name: &str, value: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{name}"),
            value: value.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, StorageBackend};
    use crate::model::card::PlaceholderPolicy;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_use_sqlite_without_sync() {
        let config = config_from(&[]).unwrap();
        assert!(matches!(config.storage, StorageBackend::Sqlite(_)));
        assert!(config.sync.is_none());
        assert!(config.settings.confirm_card_delete);
        assert_eq!(config.settings.placeholder_policy, PlaceholderPolicy::Deferred);
    }

    #[test]
    fn memory_only_wins_over_paths() {
        let config = config_from(&[
            ("STORYCARDS_MEMORY_ONLY", "yes"),
            ("STORYCARDS_STORE_FILE", "/tmp/cards.json"),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);

        let config = config_from(&[("STORYCARDS_STORE_FILE", " /tmp/cards.json ")]).unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::JsonFile(PathBuf::from("/tmp/cards.json"))
        );
    }

    #[test]
    fn sync_settings_are_read_when_enabled() {
        let config = config_from(&[
            ("STORYCARDS_SYNC_ENABLED", "true"),
            ("STORYCARDS_SYNC_OWNER", "alice"),
            ("STORYCARDS_SYNC_BRANCH", "drafts"),
            ("STORYCARDS_SYNC_DEBOUNCE_MS", "250"),
            ("STORYCARDS_SYNC_TOKEN", ""),
        ])
        .unwrap();
        let sync = config.sync.expect("sync should be enabled");
        assert_eq!(sync.target.owner, "alice");
        assert_eq!(sync.target.repo, "story-cards");
        assert_eq!(sync.target.branch, "drafts");
        assert_eq!(sync.debounce, Duration::from_millis(250));
        assert!(sync.token.is_none());
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config_from(&[("STORYCARDS_CONFIRM_CARD_DELETE", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("STORYCARDS_CONFIRM_CARD_DELETE"));

        let err = config_from(&[("STORYCARDS_PLACEHOLDER", "loud")]).unwrap_err();
        assert!(err.to_string().contains("deferred|eager"));

        let err = config_from(&[
            ("STORYCARDS_SYNC_ENABLED", "1"),
            ("STORYCARDS_SYNC_TIMEOUT_SECS", "-3"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
