//! Configuration for the event logger.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for the event logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log file path; empty derives `Event-<utc>.log` from the start time
    pub log_name: String,

    /// Directory for derived log names; empty is the working directory
    pub log_dir: PathBuf,

    /// Free-text note written into the log header
    pub note: String,

    /// Channels per sample vector
    pub vlen: usize,

    /// Bandwidth recorded in the header, never used in computation
    pub bandwidth: f64,

    /// Path for storing session statistics
    pub data_path: PathBuf,

    /// What to do with a watermark when its row cannot be written
    pub write_failure: WriteFailurePolicy,

    /// Bound of the channel between the batch source and the logger
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ra-event-log");

        Self {
            log_name: String::new(),
            log_dir: PathBuf::new(),
            note: "Event Detection".to_string(),
            vlen: 1024,
            bandwidth: 1.0,
            data_path: data_dir,
            write_failure: WriteFailurePolicy::default(),
            channel_capacity: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, defaults if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ra-event-log")
            .join("config.json")
    }

    /// Path of the persisted session statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("session.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Reject values the logger cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vlen == 0 {
            return Err(ConfigError::ZeroVectorLength);
        }
        if self.bandwidth == 0.0 {
            return Err(ConfigError::ZeroBandwidth);
        }
        Ok(())
    }
}

/// Handling of watermarks when a log row cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// The row counts as logged; its data is not retried.
    #[default]
    AdvanceWatermark,
    /// The watermark stays put, so the next batch tries the row again if the
    /// metadata has not moved on.
    HoldWatermark,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid bandwidth: 0")]
    ZeroBandwidth,
    #[error("Invalid vector length: 0")]
    ZeroVectorLength,
}
