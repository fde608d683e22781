//! Error types for fin-acl
//!
//! Reads treat a missing resource as an empty answer; mutations treat it as
//! [`Error::NotFound`]. Records missing a required field are skipped during
//! resolution and never surface here.

use serde::Serialize;
use thiserror::Error;

use fin_client::Method;
use fin_core::ResourcePath;

/// Result type alias for fin-acl operations
pub type Result<T> = std::result::Result<T, Error>;

/// A mutation sub-step that completed before a later step failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// A resource was created.
    Created {
        /// The new resource
        path: ResourcePath,
    },
    /// A target was linked to an ACL container.
    Linked {
        /// The linked resource
        target: ResourcePath,
        /// The ACL container it now advertises
        acl: ResourcePath,
    },
    /// A resource was patched in place.
    Patched {
        /// The patched resource
        path: ResourcePath,
    },
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Created { path } => write!(f, "created {path}"),
            Step::Linked { target, acl } => write!(f, "linked {target} to {acl}"),
            Step::Patched { path } => write!(f, "patched {path}"),
        }
    }
}

/// Errors that can occur in fin-acl
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from fin-client
    #[error("Client error: {0}")]
    Client(#[from] fin_client::Error),

    /// Error from fin-core
    #[error("Core error: {0}")]
    Core(#[from] fin_core::Error),

    /// Error from fin-graph
    #[error("Graph error: {0}")]
    Graph(#[from] fin_graph::Error),

    /// A mutation target does not exist.
    #[error("{what} not found: {path}")]
    NotFound {
        /// What was expected at the path
        what: &'static str,
        /// The missing path
        path: ResourcePath,
    },

    /// The resource to create already exists.
    #[error("Already exists: {path}")]
    Conflict {
        /// The existing path
        path: ResourcePath,
    },

    /// The store answered a required request with a non-2xx status.
    #[error("{step} failed: {method} {path} returned {status}")]
    Upstream {
        /// The operation step that issued the request
        step: &'static str,
        /// Request method
        method: Method,
        /// Request path
        path: ResourcePath,
        /// Response status
        status: u16,
    },

    /// A multi-step mutation stopped part way through.
    #[error("{operation} stopped after {} completed step(s): {source}", .completed.len())]
    Partial {
        /// The operation that was running
        operation: &'static str,
        /// Steps that took effect, in order
        completed: Vec<Step>,
        /// The failure that stopped it
        #[source]
        source: Box<Error>,
    },

    /// Caller input that cannot be acted on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(what: &'static str, path: &ResourcePath) -> Self {
        Self::NotFound {
            what,
            path: path.clone(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(path: &ResourcePath) -> Self {
        Self::Conflict { path: path.clone() }
    }

    /// Create an upstream error for a failed request.
    pub fn upstream(step: &'static str, method: Method, path: &ResourcePath, status: u16) -> Self {
        Self::Upstream {
            step,
            method,
            path: path.clone(),
            status,
        }
    }

    /// Wrap `source` with the steps that completed before it.
    ///
    /// With nothing completed the source is returned unchanged.
    pub fn partial(operation: &'static str, completed: Vec<Step>, source: Error) -> Self {
        if completed.is_empty() {
            return source;
        }
        Self::Partial {
            operation,
            completed,
            source: Box::new(source),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Steps that completed before the failure (empty unless `Partial`).
    pub fn completed_steps(&self) -> &[Step] {
        match self {
            Self::Partial { completed, .. } => completed,
            _ => &[],
        }
    }

    /// Whether re-issuing the failed step may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_transient(),
            Self::Upstream { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Partial { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
