//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{self, config_path};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Bridge endpoint and framing settings
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Named pipe read by the bridge
    #[serde(default = "paths::default_input")]
    pub input: PathBuf,

    /// File receiving everything the remote host sends
    #[serde(default = "paths::default_output")]
    pub output: PathBuf,

    /// Largest record relayed in one piece
    #[serde(default = "default_line_capacity")]
    pub line_capacity: usize,

    /// Permission bits used when creating the named pipe
    #[serde(default = "default_fifo_mode")]
    pub fifo_mode: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            input: paths::default_input(),
            output: paths::default_output(),
            line_capacity: default_line_capacity(),
            fifo_mode: default_fifo_mode(),
        }
    }
}

fn default_line_capacity() -> usize {
    4096
}
fn default_fifo_mode() -> u32 {
    0o700
}

/// Logging configuration
#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    /// Log file used in addition to stderr once the process has detached
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.bridge.line_capacity == 0 {
            return Err(Error::Config(
                "bridge.line_capacity must be at least 1".to_string(),
            ));
        }
        if self.bridge.fifo_mode & !0o777 != 0 {
            return Err(Error::Config(format!(
                "bridge.fifo_mode {:o} has bits outside 0o777",
                self.bridge.fifo_mode
            )));
        }
        Ok(())
    }
}
