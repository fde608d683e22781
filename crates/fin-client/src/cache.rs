//! Response cache decorator.
//!
//! [`CachingStore`] remembers HEAD and GET responses keyed by method, path
//! and `Accept` header. Writes issued through it drop every entry they can
//! affect: the written path, its descendants (which inherit ACL links) and
//! its ancestors (whose containment changes). Writes made by other clients
//! are not seen; callers own invalidation in that case. With a TTL, expired
//! entries are dropped when looked up and whenever a new response is stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use fin_core::{CacheConfig, ResourcePath};

use crate::Result;
use crate::store::{Method, Store, StoreRequest, StoreResponse};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    method: Method,
    path: ResourcePath,
    accept: Option<String>,
}

#[derive(Debug)]
struct CachedResponse {
    response: StoreResponse,
    fetched_at: Instant,
}

/// Hit and miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from cache
    pub hits: u64,
    /// Forwarded to the inner store
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
}

/// A store wrapper caching read responses.
#[derive(Debug)]
pub struct CachingStore<S> {
    inner: S,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<CacheKey, CachedResponse>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: Store> CachingStore<S> {
    /// Cache entries until invalidated.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ttl: None,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Expire entries after `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Build from the `[cache]` configuration section.
    pub fn from_config(inner: S, config: &CacheConfig) -> Self {
        let store = Self::new(inner);
        match config.ttl_seconds {
            Some(seconds) => store.with_ttl(Duration::from_secs(seconds)),
            None => store,
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop cached responses for exactly `path`.
    pub fn invalidate(&self, path: &ResourcePath) {
        self.retain(|key| &key.path != path);
    }

    /// Drop cached responses for `path` and everything beneath it.
    pub fn invalidate_subtree(&self, path: &ResourcePath) {
        self.retain(|key| !key.path.is_within(path));
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    fn retain<F: Fn(&CacheKey) -> bool>(&self, keep: F) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| keep(key));
    }

    fn is_expired(&self, cached: &CachedResponse) -> bool {
        self.ttl.is_some_and(|ttl| cached.fetched_at.elapsed() >= ttl)
    }

    /// A live cached response. An expired entry is removed.
    fn lookup(&self, key: &CacheKey) -> Option<StoreResponse> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let cached = entries.get(key)?;
            if !self.is_expired(cached) {
                return Some(cached.response.clone());
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|cached| self.is_expired(cached)) {
            entries.remove(key);
        }
        None
    }

    /// Store a response, pruning expired entries first.
    fn remember(&self, key: CacheKey, response: StoreResponse) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.ttl.is_some() {
            entries.retain(|_, cached| !self.is_expired(cached));
        }
        entries.insert(
            key,
            CachedResponse {
                response,
                fetched_at: Instant::now(),
            },
        );
    }

    fn invalidate_for_write(&self, request: &StoreRequest) {
        let mut touched = request.path.clone();
        if request.method == Method::Post
            && let Some(slug) = request.header("slug")
            && let Ok(created) = request.path.join(slug)
        {
            touched = created;
        }
        let ancestors: Vec<ResourcePath> = touched.ancestors().collect();
        self.retain(|key| !key.path.is_within(&touched) && !ancestors.contains(&key.path));
        tracing::trace!(path = %touched, "Invalidated cached responses");
    }
}

#[async_trait]
impl<S: Store> Store for CachingStore<S> {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse> {
        if !request.method.is_read() {
            let response = self.inner.send(request.clone()).await;
            self.invalidate_for_write(&request);
            return response;
        }

        let key = CacheKey {
            method: request.method,
            path: request.path.clone(),
            accept: request.header("accept").map(String::from),
        };
        if let Some(response) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(method = %key.method, path = %key.path, "Cache hit");
            return Ok(response);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let response = self.inner.send(request).await?;
        if response.is_success() || response.is_missing() {
            self.remember(key, response.clone());
        }
        Ok(response)
    }

    fn iri_for(&self, path: &ResourcePath) -> String {
        self.inner.iri_for(path)
    }

    fn path_for(&self, iri: &str) -> Option<ResourcePath> {
        self.inner.path_for(iri)
    }

    fn resolve(&self, from: &ResourcePath, reference: &str) -> Option<ResourcePath> {
        self.inner.resolve(from, reference)
    }
}

// ============================================================================
// Tests
// ============================================================================
