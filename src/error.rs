//! Crate-level error types.
//!
//! Only failures that stop a whole run live here. Per-file and per-task
//! failures have their own types (`FileOpError`, `AugmentError`) and are
//! collected into run reports instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Fatal errors for a dataset preparation run
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl DatasetError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised by configuration validation
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::ConfigFile { .. })
    }
}
