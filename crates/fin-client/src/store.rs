//! The store abstraction.
//!
//! A [`Store`] answers HTTP-shaped requests against repository paths. The
//! engine only ever talks to this trait; [`crate::HttpStore`] speaks to a
//! real server, [`crate::MemoryStore`] keeps everything in process and
//! [`crate::CachingStore`] decorates either.

use std::fmt;

use async_trait::async_trait;

use fin_core::ResourcePath;
use fin_graph::{Graph, jsonld};

use crate::Result;
use crate::link::targets_with_rel;

/// `application/ld+json`
pub const JSON_LD: &str = "application/ld+json";
/// Accept header asking for expanded JSON-LD.
pub const JSON_LD_EXPANDED: &str =
    "application/ld+json; profile=\"http://www.w3.org/ns/json-ld#expanded\"";
/// `application/n-triples`
pub const N_TRIPLES: &str = "application/n-triples";
/// `application/sparql-update`
pub const SPARQL_UPDATE: &str = "application/sparql-update";

// ============================================================================
// Request / response
// ============================================================================

/// Request method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// Metadata only.
    Head,
    /// Metadata and body.
    Get,
    /// Create a child.
    Post,
    /// Create or replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
}

impl Method {
    /// Upper-case HTTP name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the method never changes repository state.
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Head | Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against a repository path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRequest {
    /// Method
    pub method: Method,
    /// Target path
    pub path: ResourcePath,
    /// Extra headers, in order
    pub headers: Vec<(String, String)>,
    /// Body, if any
    pub body: Option<String>,
}

impl StoreRequest {
    /// A request with no headers or body.
    pub fn new(method: Method, path: ResourcePath) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body and its content type.
    pub fn with_body(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body.into());
        self
    }

    /// Set the `Slug` header used by POST.
    pub fn with_slug(self, slug: impl Into<String>) -> Self {
        self.with_header("Slug", slug)
    }

    /// First header value with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Status, headers and body of a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers in arrival order; names may repeat
    pub headers: Vec<(String, String)>,
    /// Body text (empty for HEAD)
    pub body: String,
}

impl StoreResponse {
    /// A response with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 404 or 410
    pub fn is_missing(&self) -> bool {
        matches!(self.status, 404 | 410)
    }

    /// First header value with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value of a repeated header.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Link targets with relation `rel`, in header order.
    pub fn link_targets(&self, rel: &str) -> Vec<String> {
        targets_with_rel(self.header_values("link"), rel)
    }

    /// Decode the body as JSON-LD, resolving relative IRIs against `base`.
    pub fn graph(&self, base: &str) -> Result<Graph> {
        Ok(jsonld::parse(&self.body, Some(base))?)
    }
}

// ============================================================================
// Store trait
// ============================================================================

/// A repository reachable by path.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute one request.
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse>;

    /// Absolute IRI of a path.
    fn iri_for(&self, path: &ResourcePath) -> String;

    /// Repository path of an IRI, if it belongs to this repository.
    fn path_for(&self, iri: &str) -> Option<ResourcePath>;

    /// Repository path of a URI reference seen on the resource at `from`.
    ///
    /// Relative references resolve against `from`'s IRI.
    fn resolve(&self, from: &ResourcePath, reference: &str) -> Option<ResourcePath>;

    /// Fetch headers only.
    async fn head(&self, path: &ResourcePath) -> Result<StoreResponse> {
        self.send(StoreRequest::new(Method::Head, path.clone())).await
    }

    /// Fetch the resource as expanded JSON-LD.
    async fn get(&self, path: &ResourcePath) -> Result<StoreResponse> {
        self.send(
            StoreRequest::new(Method::Get, path.clone()).with_header("Accept", JSON_LD_EXPANDED),
        )
        .await
    }

    /// Create a resource at `parent/slug` from a JSON-LD graph.
    async fn post(
        &self,
        parent: &ResourcePath,
        slug: &str,
        body: &Graph,
    ) -> Result<StoreResponse> {
        let payload = jsonld::serialize(body)?;
        self.send(
            StoreRequest::new(Method::Post, parent.clone())
                .with_slug(slug)
                .with_body(JSON_LD, payload),
        )
        .await
    }

    /// Create or replace a resource from a JSON-LD graph.
    async fn put(&self, path: &ResourcePath, body: &Graph) -> Result<StoreResponse> {
        let payload = jsonld::serialize(body)?;
        self.send(StoreRequest::new(Method::Put, path.clone()).with_body(JSON_LD, payload))
            .await
    }

    /// Apply a SPARQL-Update script.
    async fn patch(&self, path: &ResourcePath, update: &str) -> Result<StoreResponse> {
        self.send(
            StoreRequest::new(Method::Patch, path.clone()).with_body(SPARQL_UPDATE, update),
        )
        .await
    }

    /// Remove a resource.
    async fn delete(&self, path: &ResourcePath) -> Result<StoreResponse> {
        self.send(StoreRequest::new(Method::Delete, path.clone()))
            .await
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse> {
        (**self).send(request).await
    }

    fn iri_for(&self, path: &ResourcePath) -> String {
        (**self).iri_for(path)
    }

    fn path_for(&self, iri: &str) -> Option<ResourcePath> {
        (**self).path_for(iri)
    }

    fn resolve(&self, from: &ResourcePath, reference: &str) -> Option<ResourcePath> {
        (**self).resolve(from, reference)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = StoreRequest::new(Method::Post, ResourcePath::root())
            .with_slug("lib/.acl")
            .with_body(JSON_LD, "[]");
        assert_eq!(request.header("slug"), Some("lib/.acl"));
        assert_eq!(request.header("content-type"), Some(JSON_LD));
        assert_eq!(request.body.as_deref(), Some("[]"));
    }

    #[test]
    fn test_response_link_targets_across_headers() {
        let response = StoreResponse::new(200)
            .with_header("Link", "<http://h/x/.acl>; rel=\"acl\"")
            .with_header("link", "<http://h/t>; rel=\"type\", <http://h/x/.acl2>; rel=\"acl\"");
        assert_eq!(
            response.link_targets("acl"),
            vec!["http://h/x/.acl", "http://h/x/.acl2"]
        );
    }

    #[test]
    fn test_response_status_classes() {
        assert!(StoreResponse::new(204).is_success());
        assert!(StoreResponse::new(410).is_missing());
        assert!(!StoreResponse::new(500).is_success());
        assert!(!StoreResponse::new(500).is_missing());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert!(Method::Head.is_read());
        assert!(!Method::Delete.is_read());
    }
}
