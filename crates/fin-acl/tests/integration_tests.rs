//! Integration test suite for fin-acl.
//!
//! Drives the engine end to end against an in-memory repository: ACL
//! discovery, index building, root propagation, merging across several
//! ACLs, and the mutation operations with their failure reporting.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
