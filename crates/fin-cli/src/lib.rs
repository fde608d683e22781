//! # fin-cli
//!
//! The `fin` command-line tool.
//!
//! - ACL discovery and resolution (`fin acl locate|show|index|root|roles`)
//! - ACL administration (`fin acl create|link|grant|revoke`)
//! - Group management (`fin group create|show|add|remove`)
//! - Site administrators (`fin admin add|remove`)
//! - Configuration (`fin config path|get|set|init|export`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;

pub use cli::Cli;
pub use error::{Error, Result};
