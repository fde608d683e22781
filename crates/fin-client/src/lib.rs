//! # fin-client
//!
//! Store adapters for Fedora-style LDP repositories.
//!
//! - [`Store`]: the async request trait the access-control engine uses
//! - [`HttpStore`]: `reqwest` transport with bearer-token auth
//! - [`MemoryStore`]: in-process repository for tests and dry runs
//! - [`CachingStore`]: opt-in HEAD/GET response cache with invalidation
//! - [`link`]: `Link` header parsing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod http;
pub mod link;
pub mod memory;
pub mod store;

pub use cache::{CacheStats, CachingStore};
pub use error::{Error, Result};
pub use http::HttpStore;
pub use link::{Link, parse_link_header};
pub use memory::MemoryStore;
pub use store::{Method, Store, StoreRequest, StoreResponse};
