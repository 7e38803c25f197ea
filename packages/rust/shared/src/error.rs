//! Error types for Datawalker.
//!
//! Library crates use [`DatawalkerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Datawalker operations.
#[derive(Debug, thiserror::Error)]
pub enum DatawalkerError {
    /// Configuration loading or validation error (including ambiguous sources).
    #[error("config error: {message}")]
    Config { message: String },

    /// A source document could not be turned into a usable tree.
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The page template could not be obtained.
    #[error("assembly error: {message}")]
    Assembly { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid rule or pattern definition.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DatawalkerError>;

impl DatawalkerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error for the given source document.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an assembly error from any displayable message.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly {
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

    /// Whether this error is a parse failure of a source document.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
