//! Configuration for the rename-expr command line front end.
//!
//! Configuration is loaded from `<config dir>/rename-expr/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamerConfig {
    /// Directory that relative file paths resolve against.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Prefix long absolute paths so Windows accepts them.
    #[serde(default = "default_long_paths")]
    pub long_paths: bool,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// How often the CLI checks for a finished batch, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_long_paths() -> bool {
    true
}

fn default_log_filter() -> String {
    "rename_expr=info".to_string()
}

fn default_poll_interval() -> u64 {
    16
}

impl Default for RenamerConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            long_paths: default_long_paths(),
            log_filter: default_log_filter(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl RenamerConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "rename-expr")
            .context("Could not determine a configuration directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
