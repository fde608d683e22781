//! Common test utilities for fin-acl integration tests.

#![allow(dead_code)]

use fin_acl::{AclService, AddAuthorization, CreateAcl, Grantee, Mode};
use fin_client::{MemoryStore, Store};
use fin_core::ResourcePath;
use fin_graph::Graph;

/// Parse a path, panicking on bad test input.
pub fn p(path: &str) -> ResourcePath {
    ResourcePath::new(path).unwrap()
}

/// A service over an empty in-memory repository.
pub fn service() -> AclService<MemoryStore> {
    AclService::new(MemoryStore::new())
}

/// Create plain resources at each path.
pub fn resources(store: &MemoryStore, paths: &[&str]) {
    for path in paths {
        store.insert(&p(path), Graph::new());
    }
}

/// Create the default ACL container for `target`.
pub async fn acl_for<S: Store>(service: &AclService<S>, target: &str) -> ResourcePath {
    service.create_acl(CreateAcl::new(p(target))).await.unwrap()
}

/// Grant `modes` on `target` to user `agent`, in `acl` when given.
pub async fn grant<S: Store>(
    service: &AclService<S>,
    target: &str,
    agent: &str,
    modes: &[Mode],
    acl: Option<&ResourcePath>,
) -> ResourcePath {
    let mut options = AddAuthorization::new(
        p(target),
        Grantee::User(agent.to_string()),
        modes.iter().copied(),
    );
    if let Some(acl) = acl {
        options = options.in_acl(acl.clone());
    }
    service.add_authorization(options).await.unwrap()
}
