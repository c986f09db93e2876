// src/error.rs

//! Crate-wide error types
//!
//! Errors are grouped by where they surface: validation errors are
//! rejected synchronously at submission, per-package lookup errors are
//! absorbed into warnings by the research unit, and pipeline/storage
//! errors terminal-fail a job.

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Pinion error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty submission, rejected before a job is created
    #[error("validation error: {0}")]
    Validation(String),

    /// Package does not exist in the registry (expected, not retried)
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Registry communication or response parsing failure
    #[error("registry error: {0}")]
    Registry(String),

    /// Job store read/write failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Uncaught failure inside a background pipeline phase
    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
