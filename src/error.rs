//! Domain-specific error types for startup-signals

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for collection runs.
///
/// Only caller-supplied input problems are fatal to a run. Failures of
/// individual sources are reported as [`crate::fetchers::SourceError`] and never
/// surface through this type.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Seed payload not found: {}", path.display())]
    SeedNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for SignalError {
    fn from(err: anyhow::Error) -> Self {
        SignalError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SignalError {
    fn from(err: serde_json::Error) -> Self {
        SignalError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SignalError {
    fn from(err: std::io::Error) -> Self {
        SignalError::Io {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for SignalError {
    fn from(err: csv::Error) -> Self {
        SignalError::Serialization {
            message: format!("CSV write failed: {}", err),
        }
    }
}

/// Result type alias for collection operations
pub type Result<T> = std::result::Result<T, SignalError>;
