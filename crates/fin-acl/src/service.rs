//! The engine facade.
//!
//! [`AclService`] owns a [`Store`] and the ACL naming conventions. Its
//! operations are spread over the sibling modules: [`crate::locator`],
//! [`crate::index`], [`crate::root`], [`crate::merge`], [`crate::mutation`]
//! and [`crate::roles`]. The service holds no authoritative state; the
//! store's graphs are the only source of truth.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

use fin_client::{Method, Store, StoreResponse};
use fin_core::{AclConfig, ResourcePath};
use fin_graph::Graph;

use crate::{Error, Result};

/// Access-control resolution and administration over a store.
#[derive(Debug)]
pub struct AclService<S> {
    pub(crate) store: S,
    pub(crate) config: AclConfig,
    pub(crate) locks: PathLocks,
}

impl<S: Store> AclService<S> {
    /// A service using the default ACL conventions.
    pub fn new(store: S) -> Self {
        Self::with_config(store, AclConfig::default())
    }

    /// A service using `config` for naming and request concurrency.
    pub fn with_config(store: S, config: AclConfig) -> Self {
        Self {
            store,
            config,
            locks: PathLocks::default(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// ACL conventions in use.
    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    /// How many requests one fan-out may keep in flight.
    pub(crate) fn concurrency(&self) -> usize {
        self.config.max_concurrent_requests.max(1)
    }

    /// HEAD `path`, failing with `NotFound` when it is missing.
    pub(crate) async fn require_exists(
        &self,
        what: &'static str,
        step: &'static str,
        path: &ResourcePath,
    ) -> Result<StoreResponse> {
        let response = self.store.head(path).await?;
        if response.is_missing() {
            return Err(Error::not_found(what, path));
        }
        expect_success(step, Method::Head, path, response)
    }

    /// HEAD `path`, returning whether it exists.
    pub(crate) async fn exists(&self, step: &'static str, path: &ResourcePath) -> Result<bool> {
        let response = self.store.head(path).await?;
        if response.is_missing() {
            return Ok(false);
        }
        expect_success(step, Method::Head, path, response)?;
        Ok(true)
    }

    /// GET `path` as a graph, `None` when it is missing.
    pub(crate) async fn fetch_graph(
        &self,
        step: &'static str,
        path: &ResourcePath,
    ) -> Result<Option<Graph>> {
        let response = self.store.get(path).await?;
        if response.is_missing() {
            return Ok(None);
        }
        let response = expect_success(step, Method::Get, path, response)?;
        let graph = response.graph(&self.store.iri_for(path))?;
        tracing::debug!(path = %path, triples = graph.len(), "Fetched graph");
        Ok(Some(graph))
    }
}

/// Pass 2xx responses through; turn anything else into `Upstream`.
pub(crate) fn expect_success(
    step: &'static str,
    method: Method,
    path: &ResourcePath,
    response: StoreResponse,
) -> Result<StoreResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::upstream(step, method, path, response.status))
    }
}

// ============================================================================
// Per-path locks
// ============================================================================

/// One async mutex per path, created on demand.
///
/// Entries nobody holds are pruned whenever a new lock is taken.
#[derive(Debug, Default)]
pub(crate) struct PathLocks {
    locks: std::sync::Mutex<HashMap<ResourcePath, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Wait for exclusive use of `path`.
    pub(crate) async fn lock(&self, path: &ResourcePath) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(path.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// ============================================================================
// Tests
// ============================================================================
