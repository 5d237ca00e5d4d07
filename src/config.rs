//! Field configuration using TOML
//!
//! Looked up in ~/.config/tetrode/field.toml (or platform equivalent).
//! Tick thresholds are counted in driver ticks, so they only make sense
//! relative to the cadence the driver calls the engine at.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ticks between forced one-row drops
pub const AUTO_DROP_TICKS: u32 = 15;
/// Ticks a resting piece may sit before it locks
pub const LOCK_DELAY_TICKS: u32 = 50;
/// Ticks the clear animation lasts before full rows collapse
pub const CLEAR_DELAY_TICKS: u32 = 30;

/// Smallest board that still fits every piece in every orientation
pub const MIN_BOARD_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board must be at least {min}x{min}, got {width}x{height}", min = MIN_BOARD_SIZE)]
    DegenerateBoard { width: usize, height: usize },
    #[error("timing threshold `{0}` must be non-zero")]
    ZeroThreshold(&'static str),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Field construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub board_width: usize,
    pub board_height: usize,
    pub timing: TimingConfig,
}

/// Tick-counted delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub auto_drop_ticks: u32,
    pub lock_delay_ticks: u32,
    pub clear_delay_ticks: u32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            board_width: 10,
            board_height: 40,
            timing: TimingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            auto_drop_ticks: AUTO_DROP_TICKS,
            lock_delay_ticks: LOCK_DELAY_TICKS,
            clear_delay_ticks: CLEAR_DELAY_TICKS,
        }
    }
}

impl FieldConfig {
    /// Default timing on a board of the given size
    pub fn with_size(board_width: usize, board_height: usize) -> Self {
        Self {
            board_width,
            board_height,
            ..Self::default()
        }
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tetrode", "tetrode")
            .map(|dirs| dirs.config_dir().join("field.toml"))
    }

    /// Load from the platform config directory, or defaults if there is none
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject dimensions and thresholds the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_width < MIN_BOARD_SIZE || self.board_height < MIN_BOARD_SIZE {
            return Err(ConfigError::DegenerateBoard {
                width: self.board_width,
                height: self.board_height,
            });
        }

        let timing = &self.timing;
        if timing.auto_drop_ticks == 0 {
            return Err(ConfigError::ZeroThreshold("auto_drop_ticks"));
        }
        if timing.clear_delay_ticks == 0 {
            return Err(ConfigError::ZeroThreshold("clear_delay_ticks"));
        }
        Ok(())
    }
}
