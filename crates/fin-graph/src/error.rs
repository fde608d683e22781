//! Error types for fin-graph

use thiserror::Error;

/// Result type alias for fin-graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding or encoding graphs
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON was valid but not a JSON-LD shape we understand.
    #[error("JSON-LD error: {message}")]
    JsonLd {
        /// What was wrong
        message: String,
    },

    /// An N-Triples term or SPARQL-Update script could not be parsed.
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset into the input
        offset: usize,
        /// What was expected
        message: String,
    },

    /// A patch cannot be expressed as a SPARQL-Update data operation.
    #[error("Unsupported patch: {0}")]
    UnsupportedPatch(String),
}

impl Error {
    /// Creates a new JSON-LD shape error.
    pub fn jsonld(message: impl Into<String>) -> Self {
        Error::JsonLd {
            message: message.into(),
        }
    }

    /// Creates a new syntax error.
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            offset,
            message: message.into(),
        }
    }
}
