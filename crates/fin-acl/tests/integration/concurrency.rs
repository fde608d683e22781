//! Integration tests for the request concurrency limit.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use fin_acl::{AclService, Mode};
use fin_client::{MemoryStore, Store, StoreRequest, StoreResponse};
use fin_core::{AclConfig, ResourcePath};

use crate::common::{acl_for, grant, p, resources};

/// Records the highest number of requests in flight at once.
#[derive(Debug, Default)]
struct GaugedStore {
    inner: MemoryStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugedStore {
    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.peak.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for GaugedStore {
    async fn send(&self, request: StoreRequest) -> fin_client::Result<StoreResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let response = self.inner.send(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
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

async fn service_with_limit(limit: usize, users: usize) -> AclService<GaugedStore> {
    let config = AclConfig {
        max_concurrent_requests: limit,
        ..AclConfig::default()
    };
    let service = AclService::with_config(GaugedStore::default(), config);
    resources(&service.store().inner, &["/lib"]);
    acl_for(&service, "/lib").await;
    for user in 0..users {
        grant(&service, "/lib", &format!("user{user}"), &[Mode::Read], None).await;
    }
    service
}

#[tokio::test]
async fn test_index_walk_respects_limit() {
    let service = service_with_limit(2, 10).await;
    service.store().reset();

    let index = service.build_index(&p("/lib/.acl")).await.unwrap();
    assert_eq!(index.get(&p("/lib")).unwrap().authorizations.len(), 10);
    assert!(service.store().peak() <= 2, "peak {}", service.store().peak());
}

#[tokio::test]
async fn test_single_request_limit_still_resolves() {
    let service = service_with_limit(1, 4).await;
    service.store().reset();

    let result = service.authorizations(&p("/lib")).await.unwrap();
    for user in 0..4 {
        let agent = format!("user{user}");
        assert!(result.allows(Some(agent.as_str()), Mode::Read));
    }
    assert_eq!(service.store().peak(), 1);
}

#[tokio::test]
async fn test_batch_resolution_respects_limit() {
    let service = service_with_limit(3, 2).await;
    let paths: Vec<ResourcePath> = (0..8).map(|i| p(&format!("/lib/item{i}"))).collect();
    for path in &paths {
        service.store().inner.insert(path, fin_graph::Graph::new());
    }
    service.store().reset();

    let results = service.authorizations_for(&paths).await.unwrap();
    assert_eq!(results.len(), 8);
    assert!(results.values().all(|r| r.defined_at == vec![p("/lib/.acl")]));
    // Three paths at a time, each walking at most three ACL children at a time.
    assert!(service.store().peak() <= 9, "peak {}", service.store().peak());
}
