//! Error types for fin-client

use thiserror::Error;

/// Result type alias for fin-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a store.
///
/// Non-2xx responses are not errors at this layer; they come back as a
/// [`crate::StoreResponse`] for the caller to classify.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fin-core
    #[error("Core error: {0}")]
    Core(#[from] fin_core::Error),

    /// Error decoding or encoding a graph
    #[error("Graph error: {0}")]
    Graph(#[from] fin_graph::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
