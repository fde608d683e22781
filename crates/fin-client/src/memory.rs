//! In-process repository.
//!
//! [`MemoryStore`] mimics the parts of a Fedora-style LDP server the engine
//! depends on:
//!
//! - graphs stored per path, with `""` subjects rewritten to the resource IRI
//! - `ldp:contains` derived from the nearest existing descendants, so
//!   intermediate path segments created by multi-segment slugs stay hidden
//! - `Link: <..>; rel="acl"` from the resource's own `acl:accessControl`, or
//!   else from the nearest ancestor that declares one
//! - POST with `Slug` (409 when taken, 404 when the parent is missing), PUT,
//!   SPARQL-Update PATCH and DELETE with tombstones (410)
//!
//! Requests are recorded per method and single-shot failures can be injected,
//! which lets tests observe fetch counts and partial mutation failures.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use fin_core::{FinConfig, ResourcePath};
use fin_graph::{Graph, Term, jsonld, ntriples, sparql, vocab};

use crate::Result;
use crate::store::{
    JSON_LD, Method, N_TRIPLES, SPARQL_UPDATE, Store, StoreRequest, StoreResponse,
};

#[derive(Debug)]
struct InjectedFailure {
    method: Method,
    path: ResourcePath,
    status: u16,
}

#[derive(Debug, Default)]
struct State {
    resources: BTreeMap<ResourcePath, Graph>,
    tombstones: BTreeSet<ResourcePath>,
    failures: Vec<InjectedFailure>,
    requests: Vec<(Method, ResourcePath)>,
    next_id: u64,
}

/// An in-memory repository with Fedora-like request semantics.
#[derive(Debug)]
pub struct MemoryStore {
    config: FinConfig,
    state: RwLock<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty repository (root container only) with default host and base path.
    pub fn new() -> Self {
        Self::with_config(&FinConfig::default())
    }

    /// An empty repository addressed like `config`.
    pub fn with_config(config: &FinConfig) -> Self {
        let store = Self {
            config: config.clone(),
            state: RwLock::new(State::default()),
        };
        let root = ResourcePath::root();
        let mut graph = Graph::new();
        graph.insert(
            Term::iri(store.iri_for(&root)),
            vocab::rdf::TYPE,
            Term::iri(vocab::ldp::BASIC_CONTAINER),
        );
        store.write().resources.insert(root, graph);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Direct access
    // ------------------------------------------------------------------------

    /// Create or replace a resource without going through a request.
    /// `""` subjects and objects are rewritten to the resource IRI.
    pub fn insert(&self, path: &ResourcePath, mut graph: Graph) {
        graph.rename_iri("", &self.iri_for(path));
        let mut state = self.write();
        state.tombstones.remove(path);
        state.resources.insert(path.clone(), graph);
    }

    /// The stored graph of a resource.
    pub fn graph(&self, path: &ResourcePath) -> Option<Graph> {
        self.read().resources.get(path).cloned()
    }

    /// Whether a resource exists.
    pub fn exists(&self, path: &ResourcePath) -> bool {
        self.read().resources.contains_key(path)
    }

    /// Every existing path, sorted.
    pub fn paths(&self) -> Vec<ResourcePath> {
        self.read().resources.keys().cloned().collect()
    }

    /// Answer the next `method` request on `path` with `status`.
    pub fn fail_next(&self, method: Method, path: &ResourcePath, status: u16) {
        self.write().failures.push(InjectedFailure {
            method,
            path: path.clone(),
            status,
        });
    }

    /// Number of requests seen with `method`.
    pub fn request_count(&self, method: Method) -> usize {
        self.read()
            .requests
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    /// Every request seen, in order.
    pub fn requests(&self) -> Vec<(Method, ResourcePath)> {
        self.read().requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.write().requests.clear();
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    fn children(state: &State, path: &ResourcePath) -> Vec<ResourcePath> {
        let descendants: Vec<&ResourcePath> = state
            .resources
            .keys()
            .filter(|p| path.is_ancestor_of(p))
            .collect();
        descendants
            .iter()
            .filter(|p| !descendants.iter().any(|q| q.is_ancestor_of(p)))
            .map(|p| (*p).clone())
            .collect()
    }

    fn acl_links(&self, state: &State, path: &ResourcePath) -> Vec<String> {
        std::iter::once(path.clone())
            .chain(path.ancestors())
            .filter_map(|candidate| {
                let graph = state.resources.get(&candidate)?;
                let iri = self.iri_for(&candidate);
                let links: Vec<String> = graph
                    .node(&iri)
                    .access_controls()
                    .into_iter()
                    .map(String::from)
                    .collect();
                (!links.is_empty()).then_some(links)
            })
            .next()
            .unwrap_or_default()
    }

    fn missing(state: &State, path: &ResourcePath) -> StoreResponse {
        if state.tombstones.contains(path) {
            StoreResponse::new(410)
        } else {
            StoreResponse::new(404)
        }
    }

    fn parse_body(&self, request: &StoreRequest, iri: &str) -> std::result::Result<Graph, String> {
        let body = request.body.as_deref().unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(Graph::new());
        }
        let content_type = request.header("content-type").unwrap_or(JSON_LD);
        let mut graph = if content_type.starts_with(N_TRIPLES) {
            ntriples::parse(body)
        } else if content_type.starts_with(JSON_LD) {
            jsonld::parse(body, Some(iri))
        } else {
            return Err(format!("unsupported content type {content_type}"));
        }
        .map_err(|e| e.to_string())?;
        graph.rename_iri("", iri);
        Ok(graph)
    }

    // ------------------------------------------------------------------------
    // Request handlers
    // ------------------------------------------------------------------------

    fn read_resource(&self, state: &State, request: &StoreRequest) -> Result<StoreResponse> {
        let path = &request.path;
        let Some(stored) = state.resources.get(path) else {
            return Ok(Self::missing(state, path));
        };

        let iri = self.iri_for(path);
        let mut graph = stored.clone();
        for child in Self::children(state, path) {
            graph.insert(
                Term::iri(iri.clone()),
                vocab::ldp::CONTAINS,
                Term::iri(self.iri_for(&child)),
            );
        }

        let mut response = StoreResponse::new(200).with_header(
            "Link",
            format!("<{}>; rel=\"type\"", vocab::ldp::BASIC_CONTAINER),
        );
        for acl in self.acl_links(state, path) {
            response = response.with_header("Link", format!("<{acl}>; rel=\"acl\""));
        }

        let wants_ntriples = request
            .header("accept")
            .is_some_and(|accept| accept.contains(N_TRIPLES));
        let content_type = if wants_ntriples { N_TRIPLES } else { JSON_LD };
        response = response.with_header("Content-Type", content_type);

        if request.method == Method::Get {
            let body = if wants_ntriples {
                ntriples::serialize(&graph)
            } else {
                jsonld::serialize(&graph)?
            };
            response = response.with_body(body);
        }
        Ok(response)
    }

    fn create_child(&self, state: &mut State, request: &StoreRequest) -> StoreResponse {
        let parent = &request.path;
        if !state.resources.contains_key(parent) {
            return Self::missing(state, parent);
        }

        let path = match request.header("slug") {
            Some(slug) => match parent.join(slug) {
                Ok(path) => path,
                Err(e) => return StoreResponse::new(400).with_body(e.to_string()),
            },
            None => loop {
                state.next_id += 1;
                let Ok(candidate) = parent.join(&format!("{:08x}", state.next_id)) else {
                    return StoreResponse::new(500);
                };
                if !state.resources.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        if path == *parent || state.resources.contains_key(&path) {
            return StoreResponse::new(409).with_body(format!("{path} already exists"));
        }

        let iri = self.iri_for(&path);
        let graph = match self.parse_body(request, &iri) {
            Ok(graph) => graph,
            Err(message) => return StoreResponse::new(400).with_body(message),
        };
        state.tombstones.remove(&path);
        state.resources.insert(path, graph);
        StoreResponse::new(201)
            .with_header("Location", iri.clone())
            .with_body(iri)
    }

    fn replace(&self, state: &mut State, request: &StoreRequest) -> StoreResponse {
        let path = &request.path;
        let iri = self.iri_for(path);
        let graph = match self.parse_body(request, &iri) {
            Ok(graph) => graph,
            Err(message) => return StoreResponse::new(400).with_body(message),
        };
        state.tombstones.remove(path);
        match state.resources.insert(path.clone(), graph) {
            Some(_) => StoreResponse::new(204),
            None => StoreResponse::new(201).with_header("Location", iri),
        }
    }

    fn update(&self, state: &mut State, request: &StoreRequest) -> StoreResponse {
        let path = &request.path;
        if !state.resources.contains_key(path) {
            return Self::missing(state, path);
        }
        if !request
            .header("content-type")
            .is_some_and(|ct| ct.starts_with(SPARQL_UPDATE))
        {
            return StoreResponse::new(415);
        }

        let iri = self.iri_for(path);
        let script = request.body.as_deref().unwrap_or_default();
        let patch = match sparql::parse_update(script, &iri) {
            Ok(patch) => patch,
            Err(e) => return StoreResponse::new(400).with_body(e.to_string()),
        };
        if let Some(graph) = state.resources.get_mut(path) {
            patch.apply(graph);
        }
        StoreResponse::new(204)
    }

    fn remove(state: &mut State, path: &ResourcePath) -> StoreResponse {
        if path.is_root() {
            return StoreResponse::new(405);
        }
        if !state.resources.contains_key(path) {
            return Self::missing(state, path);
        }
        state.resources.retain(|p, _| !p.is_within(path));
        state.tombstones.insert(path.clone());
        StoreResponse::new(204)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse> {
        let mut state = self.write();
        state
            .requests
            .push((request.method, request.path.clone()));

        let injected = state
            .failures
            .iter()
            .position(|f| f.method == request.method && f.path == request.path);
        let response = if let Some(idx) = injected {
            let failure = state.failures.remove(idx);
            StoreResponse::new(failure.status)
        } else {
            match request.method {
                Method::Head | Method::Get => self.read_resource(&state, &request)?,
                Method::Post => self.create_child(&mut state, &request),
                Method::Put => self.replace(&mut state, &request),
                Method::Patch => self.update(&mut state, &request),
                Method::Delete => Self::remove(&mut state, &request.path),
            }
        };

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Memory store request"
        );
        Ok(response)
    }

    fn iri_for(&self, path: &ResourcePath) -> String {
        self.config.iri_for(path)
    }

    fn path_for(&self, iri: &str) -> Option<ResourcePath> {
        self.config.path_for(iri)
    }

    fn resolve(&self, from: &ResourcePath, reference: &str) -> Option<ResourcePath> {
        self.config.resolve(from, reference)
    }
}

// ============================================================================
// Tests
// ============================================================================
