//! User defaults for jcz.
//!
//! An optional TOML file in the platform configuration directory can
//! preset the codec, level, timestamp option, relocation target and the
//! output-size flag. Command-line flags always win over the file.

use crate::constants::{CONFIG_NAME, PKG_NAME};
use crate::naming::TimestampOption;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults read from `config.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Compress command, e.g. `"tgz"` or `"xz"`.
    pub codec: Option<String>,
    /// Compression level.
    pub level: Option<i32>,
    /// Timestamp option, 0 to 3.
    pub timestamp: Option<TimestampOption>,
    /// Relocation target.
    pub move_to: Option<PathBuf>,
    pub show_output_size: bool,
}

impl Settings {
    /// Loads the settings file, or returns the defaults if there is none.
    pub fn load() -> Result<Self> {
        match config_file() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads settings from `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let toml_str = fs::read_to_string(path)
            .with_context(|| format!("Error reading config file {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("Error parsing config file {}", path.display()))
    }
}

/// Returns the absolute path to the configuration file.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join(PKG_NAME))
}
