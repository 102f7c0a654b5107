//! Error types for the export pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for export operations.
///
/// Per-node and per-asset failures are not errors: they are logged and
/// recorded as progress issues. Only job-level conditions surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Output document could not be written
    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scene description is malformed
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Settings file is malformed or out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Operation requires a running job
    #[error("No export job is running")]
    NotRunning,

    /// Image encoding failed
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid scene error.
    pub fn invalid_scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }

    /// Wrap an I/O failure on the primary output file.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite { path: path.into(), source }
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;
