//! Error type shared by the post-processing pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that can surface from the pipeline.
///
/// Only a few of these abort a processing run. Malformed raw lines and missing
/// facility IDs are recovered where they occur, and oracle failures are turned
/// into a zero hypervolume by [`crate::hypervolume::hypervolume_or_zero`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid instance {path}: {reason}")]
    InvalidInstance { path: PathBuf, reason: String },
    #[error("hypervolume oracle failed: {0}")]
    Oracle(String),
    #[error("optimizer failed: {0}")]
    Optimizer(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("lock poisoned for instance {0}")]
    Lock(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid instance error.
    pub fn invalid_instance(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidInstance {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the "not found" condition surfaced to callers.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
