//! Fin Graph: the RDF side of the repository client.
//!
//! Repository resources are described by open-ended RDF graphs. This crate
//! keeps them as plain sets of triples and gives typed access only to the
//! handful of predicates the access-control engine reads.
//!
//! # Modules
//!
//! - [`types`]: `Term`, `Triple`, `Graph` and the `Node` accessor view
//! - [`vocab`]: ACL, LDP, FOAF and RDF vocabulary IRIs
//! - [`jsonld`]: parse and serialize expanded JSON-LD
//! - [`ntriples`]: N-Triples term syntax
//! - [`diff`]: set-based graph diff (`GraphPatch`)
//! - [`sparql`]: SPARQL-Update patch scripts
//!
//! # Example
//!
//! ```rust
//! use fin_graph::{Graph, GraphPatch, Term, vocab};
//!
//! let mut old = Graph::new();
//! old.insert(Term::iri("http://h/g"), vocab::foaf::MEMBER, Term::literal("alice"));
//!
//! let mut new = old.clone();
//! new.insert(Term::iri("http://h/g"), vocab::foaf::MEMBER, Term::literal("bob"));
//!
//! let patch = GraphPatch::diff(&old, &new);
//! assert_eq!(patch.inserts.len(), 1);
//! assert!(patch.deletes.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod diff;
pub mod error;
pub mod jsonld;
pub mod ntriples;
pub mod sparql;
pub mod types;
pub mod vocab;

pub use diff::GraphPatch;
pub use error::{Error, Result};
pub use types::{Graph, Node, Term, Triple, resolve_iri};
