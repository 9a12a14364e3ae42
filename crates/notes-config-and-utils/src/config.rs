//! Configuration management for the notes tools.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default note sort order, most recently changed first.
pub const DEFAULT_SORT_ORDER: &str = "changed";

/// Default time a connection waits on a locked database.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

const LOG_LEVEL_ENV: &str = "NOTES_LOG_LEVEL";
const DATABASE_PATH_ENV: &str = "NOTES_DATABASE_PATH";

/// Main configuration, stored as `~/.notes/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Database file; `None` means [`Paths::database_file`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Note list order: title, created, created_desc or changed.
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_sort_order() -> String {
    DEFAULT_SORT_ORDER.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            database_path: None,
            sort_order: default_sort_order(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Applies `NOTES_LOG_LEVEL` and `NOTES_DATABASE_PATH`. Empty values are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|value: &String| !value.trim().is_empty());

        if let Some(log_level) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = log_level.trim().to_string();
        }
        if let Some(path) = non_empty(DATABASE_PATH_ENV) {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.busy_timeout_ms == 0 {
            return Err(CoreError::InvalidValue {
                key: "busy_timeout_ms",
                value: "0".to_string(),
            });
        }
        if self.sort_order.trim().is_empty() {
            return Err(CoreError::Config("sort_order must not be empty".to_string()));
        }
        Ok(())
    }

    /// The database file to open.
    pub fn database_file(&self, paths: &Paths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
