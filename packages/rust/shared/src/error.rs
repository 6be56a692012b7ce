//! Error types for certnorm.
//!
//! Library crates use [`CertnormError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Malformed table input never produces an error: cells that cannot be parsed
//! degrade to empty fields. Errors are reserved for configuration and I/O.

use std::path::PathBuf;

/// Top-level error type for all certnorm operations.
#[derive(Debug, thiserror::Error)]
pub enum CertnormError {
    /// Configuration or token dictionary loading/validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input document could not be parsed (invalid JSON, unknown shape).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A token dictionary parsed but is missing required entries.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Output serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CertnormError>;

impl CertnormError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for CertnormError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
