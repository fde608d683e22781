//! Error types for fin-core

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for fin-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fin-core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Configuration could not be resolved, read, or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error, optionally tied to a file.
    #[error("I/O error{}: {source}", at_path(.path))]
    Io {
        /// File involved, when known
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A string could not be turned into a repository path.
    #[error("Invalid resource path '{path}': {reason}")]
    InvalidPath {
        /// Offending input
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A named item does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of item (e.g. "resource", "config key")
        kind: String,
        /// Identifier that was looked up
        id: String,
    },
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error together with the file it concerns.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: Some(path.as_ref().to_path_buf()),
            source,
        }
    }

    /// Creates a new invalid-path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

fn at_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { path: None, source }
    }
}
