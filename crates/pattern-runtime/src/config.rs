//! Runtime configuration
//!
//! Settings are read from a TOML file. The default location is:
//! - macOS/Linux: ~/.config/pattern-runtime/config.toml
//! - Windows: %APPDATA%\pattern-runtime\config.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::eval::decode::Endianness;

const DEFAULT_MAX_SECTION_SIZE: u64 = 256 * 1024 * 1024;
const DEFAULT_MAX_CONSOLE_ENTRIES: usize = 10_000;

/// Settings applied to every evaluation context a runtime creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Mapping origin reported by `std::mem::base_address`
    pub base_address: u64,
    /// Byte order used when a script passes the native enumerant
    pub default_endian: Endianness,
    /// Largest size a user section may grow to
    pub max_section_size: u64,
    /// Console entries kept per evaluation
    pub max_console_entries: usize,
    /// Variables visible to `std::env`
    pub env: BTreeMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_address: 0,
            default_endian: Endianness::Little,
            max_section_size: DEFAULT_MAX_SECTION_SIZE,
            max_console_entries: DEFAULT_MAX_CONSOLE_ENTRIES,
            env: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pattern-runtime").join("config.toml"))
    }

    /// Load settings from the default configuration file.
    /// Returns default settings if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::default(),
        }
    }

    /// Load settings from `path`, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse settings from TOML text, then fix invalid values
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: RuntimeConfig = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate and fix invalid setting values
    fn validate(&mut self) {
        if self.max_section_size == 0 {
            self.max_section_size = DEFAULT_MAX_SECTION_SIZE;
        }
        if self.max_console_entries == 0 {
            self.max_console_entries = DEFAULT_MAX_CONSOLE_ENTRIES;
        }
    }
}
