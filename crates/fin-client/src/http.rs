//! HTTP store backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use fin_core::{FinConfig, ResourcePath};

use crate::store::{Method, Store, StoreRequest, StoreResponse};
use crate::{Error, Result};

/// A store speaking to a live repository over HTTP.
///
/// Every request carries the configured `User-Agent`,
/// `Cache-Control: no-cache`, and `Authorization: Bearer <jwt>` when a token
/// is configured. Non-2xx statuses are returned, not raised.
#[derive(Clone, Debug)]
pub struct HttpStore {
    config: FinConfig,
    client: reqwest::Client,
}

impl HttpStore {
    /// Build a store from configuration.
    pub fn new(config: FinConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    /// The configuration in use.
    pub fn config(&self) -> &FinConfig {
        &self.config
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Head => reqwest::Method::HEAD,
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn prepare_request(&self, request: &StoreRequest) -> Result<reqwest::RequestBuilder> {
        let url = self.iri_for(&request.path);
        let mut builder = self
            .client
            .request(Self::method(request.method), &url)
            .header("Cache-Control", "no-cache");

        if let Some(jwt) = &self.config.jwt {
            builder = builder.bearer_auth(jwt);
        }
        for (name, value) in &request.headers {
            if value.contains(['\r', '\n']) {
                return Err(Error::InvalidRequest(format!(
                    "header {name} contains a line break"
                )));
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

#[async_trait]
impl Store for HttpStore {
    async fn send(&self, request: StoreRequest) -> Result<StoreResponse> {
        let builder = self.prepare_request(&request)?;
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = if request.method == Method::Head {
            String::new()
        } else {
            response.text().await?
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            "Store request"
        );
        Ok(StoreResponse {
            status,
            headers,
            body,
        })
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{JSON_LD_EXPANDED, SPARQL_UPDATE};
    use fin_graph::vocab;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, jwt: Option<&str>) -> HttpStore {
        let config = FinConfig {
            host: server.uri(),
            jwt: jwt.map(String::from),
            ..Default::default()
        };
        HttpStore::new(config).unwrap()
    }

    fn p(s: &str) -> ResourcePath {
        ResourcePath::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_head_returns_link_headers() {
        let server = MockServer::start().await;
        let acl = format!("{}/fcrepo/rest/lib/.acl", server.uri());
        Mock::given(method("HEAD"))
            .and(path("/fcrepo/rest/lib/book1"))
            .and(header("Cache-Control", "no-cache"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", format!("<{acl}>; rel=\"acl\"").as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let response = store.head(&p("/lib/book1")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.link_targets("acl"), vec![acl.clone()]);
        assert_eq!(store.path_for(&acl), Some(p("/lib/.acl")));
    }

    #[tokio::test]
    async fn test_bearer_token_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fcrepo/rest/"))
            .and(header("Authorization", "Bearer secret"))
            .and(header("Accept", JSON_LD_EXPANDED))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, Some("secret"));
        let response = store.get(&ResourcePath::root()).await.unwrap();
        assert!(response.is_success());
        assert!(response.graph(&store.iri_for(&ResourcePath::root())).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let response = store.get(&p("/missing")).await.unwrap();
        assert!(response.is_missing());
    }

    #[tokio::test]
    async fn test_post_sends_slug_and_jsonld() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcrepo/rest/"))
            .and(header("Slug", "lib/.acl"))
            .and(header("Content-Type", "application/ld+json"))
            .and(body_string_contains(vocab::rdfs::LABEL))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut graph = fin_graph::Graph::new();
        graph.insert(
            fin_graph::Term::iri(""),
            vocab::rdfs::LABEL,
            fin_graph::Term::literal("Library"),
        );
        let store = store_for(&server, None);
        let response = store.post(&ResourcePath::root(), "lib/.acl", &graph).await.unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_patch_sends_sparql_update() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/fcrepo/rest/lib"))
            .and(header("Content-Type", SPARQL_UPDATE))
            .and(body_string_contains("INSERT DATA"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let response = store
            .patch(&p("/lib"), "INSERT DATA { <> <urn:p> \"x\" . }")
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FinConfig {
            host: "not a url".into(),
            ..Default::default()
        };
        assert!(HttpStore::new(config).is_err());
    }

    #[test]
    fn test_rejects_header_injection() {
        let store = HttpStore::new(FinConfig::default()).unwrap();
        let request = StoreRequest::new(Method::Get, ResourcePath::root())
            .with_header("X-Test", "a\r\nb: c");
        assert!(store.prepare_request(&request).is_err());
    }
}
