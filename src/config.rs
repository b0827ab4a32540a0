//! Runtime configuration
//!
//! Layered configuration: built-in defaults, then the global config file
//! (`$XDG_CONFIG_HOME/fsmirror/config.toml` or
//! `~/.config/fsmirror/config.toml`), then `FSMIRROR_*` environment
//! variables.

use crate::error::SnapshotError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FsMirrorConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory traversal settings
    #[serde(default)]
    pub traversal: TraversalConfig,
}

/// Directory traversal settings shared by every filesystem-backed walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: None,
        }
    }
}

impl FsMirrorConfig {
    /// Load configuration from the global file and environment overrides.
    pub fn load() -> Result<Self, SnapshotError> {
        let mut builder = Config::builder();

        if let Some(path) = global_config_path() {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("FSMIRROR").separator("__"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a TOML document, for callers embedding
    /// fsmirror that carry their own config files.
    pub fn from_toml_str(contents: &str) -> Result<Self, SnapshotError> {
        toml::from_str(contents)
            .map_err(|e| SnapshotError::Config(format!("Invalid config TOML: {}", e)))
    }
}

/// Path to the global config file.
/// Uses XDG_CONFIG_HOME when set, otherwise ~/.config/fsmirror/config.toml.
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("fsmirror").join("config.toml"));
        }
    }
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("fsmirror")
            .join("config.toml")
    })
}
