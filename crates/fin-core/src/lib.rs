//! Fin Core: shared types, configuration, errors, and path handling.
//!
//! This crate provides the foundational types used across all Fin crates.
//! It has no internal Fin dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`path`]: Repository resource paths
//! - [`config`]: Client configuration
//! - [`traits`]: Configuration management trait

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod path;
pub mod traits;

// Re-export key types at crate root for convenience
pub use config::{AclConfig, CacheConfig, FinConfig};
pub use error::{Error, Result};
pub use path::ResourcePath;
pub use traits::ConfigManager;
