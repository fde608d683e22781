//! Client configuration.
//!
//! [`FinConfig`] describes how to reach the repository (host, base path,
//! bearer token) and the ACL conventions the engine writes with. It is
//! read-only once loaded; resolution logic never mutates it.
//!
//! ```toml
//! host = "http://localhost:3000"
//! base_path = "/fcrepo/rest"
//! jwt = "eyJ..."
//!
//! [acl]
//! container_name = ".acl"
//! admin_group = "/.groups/admins"
//! max_concurrent_requests = 8
//!
//! [cache]
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::traits::ConfigManager;
use crate::{Error, ResourcePath, Result};

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinConfig {
    /// Repository host, e.g. `http://localhost:3000`.
    pub host: String,
    /// Path prefix of the repository REST root on the host.
    pub base_path: String,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Per-request timeout enforced by the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// ACL naming conventions.
    pub acl: AclConfig,
    /// Response cache settings.
    pub cache: CacheConfig,
}

impl Default for FinConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:3000".to_string(),
            base_path: "/fcrepo/rest".to_string(),
            jwt: None,
            user_agent: format!("fin-rs/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: Some(30),
            acl: AclConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Naming conventions for ACL containers and the admin group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Name of the ACL container created under a target.
    pub container_name: String,
    /// Path of the site-level admin group.
    pub admin_group: String,
    /// Upper bound on requests one resolution step keeps in flight.
    pub max_concurrent_requests: usize,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            container_name: ".acl".to_string(),
            admin_group: "/.groups/admins".to_string(),
            max_concurrent_requests: 8,
        }
    }
}

impl AclConfig {
    /// The admin group as a repository path.
    pub fn admin_group_path(&self) -> Result<ResourcePath> {
        ResourcePath::new(&self.admin_group)
    }
}

/// Settings for the optional HEAD/GET response cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether responses are cached at all.
    pub enabled: bool,
    /// Entry lifetime; `None` keeps entries until invalidated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

impl FinConfig {
    /// Check the values the transport depends on.
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(Error::config(format!(
                "base_path must start with '/', got '{}'",
                self.base_path
            )));
        }
        let base = self.base_url()?;
        if !matches!(base.scheme(), "http" | "https") || !base.has_host() {
            return Err(Error::config(format!(
                "host must be an http(s) URL, got '{}'",
                self.host
            )));
        }
        if self.acl.container_name.is_empty() || self.acl.container_name.contains('/') {
            return Err(Error::config(
                "acl.container_name must be a single path segment",
            ));
        }
        self.acl.admin_group_path()?;
        if self.acl.max_concurrent_requests == 0 {
            return Err(Error::config("acl.max_concurrent_requests must be at least 1"));
        }
        Ok(())
    }

    /// Absolute IRI for a repository path.
    pub fn iri_for(&self, path: &ResourcePath) -> String {
        path.to_iri(&self.host, &self.base_path)
    }

    /// The repository REST root: `host` followed by `base_path`.
    pub fn base_url(&self) -> Result<Url> {
        let root = format!(
            "{}{}",
            self.host.trim_end_matches('/'),
            self.base_path.trim_end_matches('/')
        );
        Url::parse(&root)
            .map_err(|e| Error::config(format!("invalid host '{}': {e}", self.host)))
    }

    /// Repository path for an IRI, if it lives under this repository.
    ///
    /// Absolute IRIs must share the configured origin (scheme, host and
    /// port, compared case-insensitively) and lie under the base path.
    /// Host-relative IRIs (`/fcrepo/rest/..`) are read against the configured
    /// host. Anything else is not a repository IRI.
    pub fn path_for(&self, iri: &str) -> Option<ResourcePath> {
        let base = self.base_url().ok()?;
        let url = match Url::parse(iri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) if iri.starts_with('/') => {
                base.join(iri).ok()?
            }
            Err(_) => return None,
        };
        path_within(&base, &url)
    }

    /// Resolve a URI reference found on the resource at `from`.
    ///
    /// Relative references (`.acl`, `../x`, `/fcrepo/rest/x`) are resolved
    /// against the resource's IRI the way RFC 3986 describes; absolute ones
    /// are checked like [`FinConfig::path_for`].
    pub fn resolve(&self, from: &ResourcePath, reference: &str) -> Option<ResourcePath> {
        let base = self.base_url().ok()?;
        let url = Url::parse(&self.iri_for(from))
            .and_then(|resource| resource.join(reference))
            .ok()?;
        path_within(&base, &url)
    }
}

fn path_within(base: &Url, url: &Url) -> Option<ResourcePath> {
    if url.origin() != base.origin() {
        return None;
    }
    ResourcePath::from_url_path(url.path(), base.path())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(Error::config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

impl ConfigManager for FinConfig {
    fn project_name() -> &'static str {
        "fin"
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FIN_HOST") {
            self.host = host;
        }
        if let Some(base_path) = lookup("FIN_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(jwt) = lookup("FIN_JWT") {
            self.jwt = if jwt.is_empty() { None } else { Some(jwt) };
        }
        if let Some(timeout) = lookup("FIN_TIMEOUT_SECONDS") {
            let seconds = timeout.parse().map_err(|_| {
                Error::config(format!("FIN_TIMEOUT_SECONDS: expected seconds, got '{timeout}'"))
            })?;
            self.timeout_seconds = Some(seconds);
        }
        if let Some(enabled) = lookup("FIN_CACHE_ENABLED") {
            self.cache.enabled = parse_flag("FIN_CACHE_ENABLED", &enabled)?;
        }
        Ok(())
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let mut vars = vec![
            ("FIN_HOST".to_string(), self.host.clone()),
            ("FIN_BASE_PATH".to_string(), self.base_path.clone()),
        ];
        if let Some(jwt) = &self.jwt {
            vars.push(("FIN_JWT".to_string(), jwt.clone()));
        }
        if let Some(timeout) = self.timeout_seconds {
            vars.push(("FIN_TIMEOUT_SECONDS".to_string(), timeout.to_string()));
        }
        vars.push((
            "FIN_CACHE_ENABLED".to_string(),
            self.cache.enabled.to_string(),
        ));
        Ok(vars)
    }
}

// ============================================================================
// Tests
// ============================================================================
