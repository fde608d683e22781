//! Error types for fin-cli

use thiserror::Error;

/// Result type alias for fin-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fin-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fin-core
    #[error("Core error: {0}")]
    Core(#[from] fin_core::Error),

    /// Error from fin-client
    #[error("Client error: {0}")]
    Client(#[from] fin_client::Error),

    /// Error from the access-control engine
    #[error(transparent)]
    Acl(#[from] fin_acl::Error),

    /// Output could not be rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command-line value was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create an invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }
}
