//! # fin-acl
//!
//! WebAC resolution and administration for Fedora-style LDP repositories.
//!
//! Given a resource path, [`AclService`] finds the ACL containers linked to
//! it, indexes the authorization records they hold, expands the groups those
//! records name, and unions the grants for the path with the grants declared
//! at each container's root. It also creates ACL containers, records and
//! groups, and edits group membership with minimal patches.
//!
//! ```rust,no_run
//! use fin_acl::{AclService, AddAuthorization, CreateAcl, Grantee, Mode};
//! use fin_client::MemoryStore;
//! use fin_core::ResourcePath;
//! use fin_graph::Graph;
//!
//! # async fn demo() -> fin_acl::Result<()> {
//! let store = MemoryStore::new();
//! let lib = ResourcePath::new("/lib")?;
//! let book = ResourcePath::new("/lib/book1")?;
//! store.insert(&lib, Graph::new());
//! store.insert(&book, Graph::new());
//!
//! let service = AclService::new(store);
//! service.create_acl(CreateAcl::new(lib)).await?;
//! service
//!     .add_authorization(AddAuthorization::new(
//!         book.clone(),
//!         Grantee::User("alice".into()),
//!         [Mode::Read],
//!     ))
//!     .await?;
//!
//! let effective = service.authorizations(&book).await?;
//! assert!(effective.allows(Some("alice"), Mode::Read));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod index;
pub mod locator;
pub mod merge;
pub mod model;
pub mod mutation;
pub mod roles;
pub mod root;
pub mod service;

pub use error::{Error, Result, Step};
pub use index::{GroupMembers, index_records};
pub use merge::{contribution, merge_grants};
pub use model::{
    AgentRef, AgentRoles, AuthorizationIndex, AuthorizationRecord, EffectiveAuthorization, Grantee,
    Grants, Group, IndexEntry, MembershipChange, Mode, PUBLIC_AGENT,
};
pub use mutation::{AddAuthorization, CreateAcl, CreateGroup, ModifyGroupMembers, record_slug};
pub use service::AclService;
