//! Effective authorization resolution.
//!
//! Every ACL linked to a path contributes the index entry for the path itself
//! and, when the ACL has a different root, the entry for that root. Entries
//! are combined by union, so the order ACLs are visited in never matters and
//! adding an ACL can only add grants.
//!
//! The result describes what the records declare. It is advisory: the
//! repository enforces access on its own at request time.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt, TryStreamExt};

use fin_client::Store;
use fin_core::ResourcePath;

use crate::model::{AuthorizationIndex, EffectiveAuthorization, Grants, IndexEntry};
use crate::service::AclService;
use crate::Result;

/// Union `from` into `into`.
pub fn merge_grants(into: &mut Grants, from: &Grants) {
    for (agent, modes) in from {
        let granted = into.entry(agent.clone()).or_default();
        for (mode, allowed) in modes {
            if *allowed {
                granted.insert(*mode, true);
            }
        }
    }
}

impl EffectiveAuthorization {
    /// Union an index entry into the result.
    pub fn merge_entry(&mut self, entry: &IndexEntry) {
        merge_grants(&mut self.authorization, &entry.authorization);
        for (record, grants) in &entry.authorizations {
            merge_grants(self.authorizations.entry(record.clone()).or_default(), grants);
        }
    }

    /// Union another result into this one; `defined_at` keeps first-seen order.
    pub fn merge(&mut self, other: &EffectiveAuthorization) {
        merge_grants(&mut self.authorization, &other.authorization);
        for (record, grants) in &other.authorizations {
            merge_grants(self.authorizations.entry(record.clone()).or_default(), grants);
        }
        for acl in &other.defined_at {
            if !self.defined_at.contains(acl) {
                self.defined_at.push(acl.clone());
            }
        }
    }
}

/// What one ACL contributes to `path`, given its index and root.
pub fn contribution(
    path: &ResourcePath,
    index: &AuthorizationIndex,
    root: Option<&ResourcePath>,
) -> EffectiveAuthorization {
    let mut result = EffectiveAuthorization::default();
    if let Some(entry) = index.get(path) {
        result.merge_entry(entry);
    }
    if let Some(root) = root
        && root != path
        && let Some(entry) = index.get(root)
    {
        result.merge_entry(entry);
    }
    result.defined_at.push(index.acl.clone());
    result
}

impl<S: Store> AclService<S> {
    /// Effective grants on `path` across every linked ACL.
    ///
    /// No linked ACL means an empty result. The ACLs' indexes and roots are
    /// resolved concurrently, bounded by `max_concurrent_requests`.
    pub async fn authorizations(&self, path: &ResourcePath) -> Result<EffectiveAuthorization> {
        let acls = self.locate_acl(path).await?;
        if acls.is_empty() {
            return Ok(EffectiveAuthorization::default());
        }

        let resolved: Vec<_> = stream::iter(&acls)
            .map(|acl| async move {
                let index = self.build_index(acl).await?;
                let root = self.find_root(acl, path).await?;
                Ok::<_, crate::Error>((index, root))
            })
            .buffered(self.concurrency())
            .try_collect()
            .await?;

        let mut result = EffectiveAuthorization::default();
        for (index, root) in &resolved {
            result.merge(&contribution(path, index, root.as_ref()));
        }

        tracing::debug!(
            path = %path,
            acls = result.defined_at.len(),
            agents = result.authorization.len(),
            "Resolved authorizations"
        );
        Ok(result)
    }

    /// Effective grants for several paths, keyed by path.
    pub async fn authorizations_for(
        &self,
        paths: &[ResourcePath],
    ) -> Result<BTreeMap<ResourcePath, EffectiveAuthorization>> {
        let results: Vec<_> = stream::iter(paths)
            .map(|path| self.authorizations(path))
            .buffered(self.concurrency())
            .try_collect()
            .await?;
        Ok(paths.iter().cloned().zip(results).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use proptest::prelude::*;

    fn p(s: &str) -> ResourcePath {
        ResourcePath::new(s).unwrap()
    }

    fn grants(pairs: &[(&str, Mode)]) -> Grants {
        let mut grants = Grants::new();
        for (agent, mode) in pairs {
            grants.entry(agent.to_string()).or_default().insert(*mode, true);
        }
        grants
    }

    fn index(acl: &str, target: &str, record: &str, pairs: &[(&str, Mode)]) -> AuthorizationIndex {
        let mut index = AuthorizationIndex::empty(p(acl));
        let entry = index.entries.entry(p(target)).or_default();
        entry.authorization = grants(pairs);
        entry.authorizations.insert(p(record), grants(pairs));
        index
    }

    #[test]
    fn test_merge_never_erases() {
        let mut into = grants(&[("bob", Mode::Read)]);
        merge_grants(&mut into, &grants(&[("bob", Mode::Write)]));
        assert_eq!(into, grants(&[("bob", Mode::Read), ("bob", Mode::Write)]));
    }

    #[test]
    fn test_contribution_includes_root_entry() {
        let index = index("/p/.acl", "/p", "/p/.acl/w", &[("a", Mode::Write)]);
        let result = contribution(&p("/p/x/y"), &index, Some(&p("/p")));
        assert!(result.allows(Some("a"), Mode::Write));
        assert_eq!(result.defined_at, vec![p("/p/.acl")]);
    }

    #[test]
    fn test_contribution_without_root_is_direct_only() {
        let index = index("/p/.acl", "/p", "/p/.acl/w", &[("a", Mode::Write)]);
        let result = contribution(&p("/p/x"), &index, None);
        assert!(result.authorization.is_empty());
        assert_eq!(result.defined_at, vec![p("/p/.acl")]);
    }

    #[test]
    fn test_root_equal_to_path_counted_once() {
        let index = index("/p/.acl", "/p", "/p/.acl/w", &[("a", Mode::Write)]);
        let result = contribution(&p("/p"), &index, Some(&p("/p")));
        assert_eq!(result.authorizations.len(), 1);
    }

    fn arb_grants() -> impl Strategy<Value = Grants> {
        prop::collection::vec(
            (prop::sample::select(vec!["alice", "bob", "carol"]), any::<bool>()),
            0..6,
        )
        .prop_map(|pairs| {
            let mut grants = Grants::new();
            for (agent, write) in pairs {
                let mode = if write { Mode::Write } else { Mode::Read };
                grants.entry(agent.to_string()).or_default().insert(mode, true);
            }
            grants
        })
    }

    proptest! {
        #[test]
        fn test_merge_is_commutative(a in arb_grants(), b in arb_grants()) {
            let mut ab = a.clone();
            merge_grants(&mut ab, &b);
            let mut ba = b.clone();
            merge_grants(&mut ba, &a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn test_merge_is_monotonic(a in arb_grants(), b in arb_grants()) {
            let mut merged = a.clone();
            merge_grants(&mut merged, &b);
            for (agent, modes) in &a {
                for mode in modes.keys() {
                    prop_assert!(merged[agent][mode]);
                }
            }
        }

        #[test]
        fn test_merge_is_idempotent(a in arb_grants()) {
            let mut twice = a.clone();
            merge_grants(&mut twice, &a);
            prop_assert_eq!(twice, a);
        }
    }
}
