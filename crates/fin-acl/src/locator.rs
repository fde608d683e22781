//! ACL discovery.
//!
//! A resource advertises the ACL containers governing it through
//! `Link: <..>; rel="acl"` headers. Zero, one or several may be present.

use fin_client::{Method, Store, StoreResponse};
use fin_core::ResourcePath;

use crate::service::{AclService, expect_success};
use crate::Result;

impl<S: Store> AclService<S> {
    /// ACL containers linked to `path`, in header order.
    ///
    /// A missing resource has no ACLs. Relative link targets resolve against
    /// the resource's IRI; links pointing outside the repository are dropped.
    pub async fn locate_acl(&self, path: &ResourcePath) -> Result<Vec<ResourcePath>> {
        let response = self.store.head(path).await?;
        if response.is_missing() {
            tracing::debug!(path = %path, "No resource, no ACLs");
            return Ok(Vec::new());
        }
        let response = expect_success("locate acl", Method::Head, path, response)?;
        Ok(self.acl_links(path, &response))
    }

    /// Map the `rel="acl"` targets of a response to repository paths.
    pub(crate) fn acl_links(&self, path: &ResourcePath, response: &StoreResponse) -> Vec<ResourcePath> {
        let mut acls: Vec<ResourcePath> = Vec::new();
        for iri in response.link_targets("acl") {
            match self.store.resolve(path, &iri) {
                Some(acl) if !acls.contains(&acl) => acls.push(acl),
                Some(_) => {}
                None => tracing::warn!(path = %path, acl = %iri, "Ignoring ACL outside the repository"),
            }
        }
        tracing::debug!(path = %path, count = acls.len(), "Located ACLs");
        acls
    }
}
