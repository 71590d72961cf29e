//! Configuration loading and management
//!
//! Settings come from an optional TOML file, then command-line flags and
//! environment variables (`TODO_FILE`, `MAX_TODOS`, `MAX_TITLE_LENGTH`,
//! `MAX_DESCRIPTION_LENGTH`, `LOG_LEVEL`) override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Upper bound accepted for `max_tasks`
pub const MAX_TASKS_CEILING: usize = 1_000_000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Primary storage file; backup and temp files live next to it
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Maximum number of tasks the store holds
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Maximum title length in characters
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,

    /// Maximum description length in characters
    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long to wait for the storage lock held by another process
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_tasks: default_max_tasks(),
            max_title_length: default_max_title_length(),
            max_description_length: default_max_description_length(),
            log_level: default_log_level(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("todos.json")
}

fn default_max_tasks() -> usize {
    1000
}

fn default_max_title_length() -> usize {
    200
}

fn default_max_description_length() -> usize {
    1000
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

/// Field length limits enforced by the record model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_title_length: usize,
    pub max_description_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            max_description_length: default_max_description_length(),
        }
    }
}

/// Per-field overrides layered on top of a loaded config
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub storage_path: Option<PathBuf>,
    pub max_tasks: Option<usize>,
    pub max_title_length: Option<usize>,
    pub max_description_length: Option<usize>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, or return defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => Err(Error::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            ))),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides and re-validate
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(path) = overrides.storage_path {
            self.storage_path = path;
        }
        if let Some(value) = overrides.max_tasks {
            self.max_tasks = value;
        }
        if let Some(value) = overrides.max_title_length {
            self.max_title_length = value;
        }
        if let Some(value) = overrides.max_description_length {
            self.max_description_length = value;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_title_length: self.max_title_length,
            max_description_length: self.max_description_length,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "storage_path cannot be empty".to_string(),
            ));
        }
        if self.max_tasks == 0 {
            return Err(Error::InvalidConfig("max_tasks must be > 0".to_string()));
        }
        if self.max_tasks > MAX_TASKS_CEILING {
            return Err(Error::InvalidConfig(format!(
                "max_tasks must be <= {MAX_TASKS_CEILING}"
            )));
        }
        if self.max_title_length == 0 {
            return Err(Error::InvalidConfig(
                "max_title_length must be > 0".to_string(),
            ));
        }
        if self.max_description_length == 0 {
            return Err(Error::InvalidConfig(
                "max_description_length must be > 0".to_string(),
            ));
        }
        if EnvFilter::try_new(self.log_level.trim()).is_err() {
            return Err(Error::InvalidConfig(format!(
                "log_level '{}' is not a valid filter",
                self.log_level
            )));
        }
        Ok(())
    }
}
