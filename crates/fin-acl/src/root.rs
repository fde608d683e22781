//! Root propagation.
//!
//! An ACL container usually governs a whole subtree. Its root is the deepest
//! ancestor of the container that advertises it.

use fin_client::Store;
use fin_core::ResourcePath;

use crate::service::AclService;
use crate::Result;

impl<S: Store> AclService<S> {
    /// The resource `acl` was attached at, or `None` for an orphaned container.
    ///
    /// Ancestors are checked deepest first; each check costs one HEAD.
    /// `requested` only labels the trace output.
    pub async fn find_root(
        &self,
        acl: &ResourcePath,
        requested: &ResourcePath,
    ) -> Result<Option<ResourcePath>> {
        for candidate in acl.ancestors() {
            if self.locate_acl(&candidate).await?.contains(acl) {
                tracing::debug!(acl = %acl, root = %candidate, requested = %requested, "Found ACL root");
                return Ok(Some(candidate));
            }
        }
        tracing::debug!(acl = %acl, requested = %requested, "No ancestor advertises ACL");
        Ok(None)
    }
}
