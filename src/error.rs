//! Error types for the snapshotting core.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by snapshot construction and the virtual filesystem cache.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Fatal probe or read failure during a traversal. The snapshot for the
    /// affected root is aborted; a partial directory hash would silently
    /// corrupt change detection.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SnapshotError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<config::ConfigError> for SnapshotError {
    fn from(err: config::ConfigError) -> Self {
        SnapshotError::Config(err.to_string())
    }
}
