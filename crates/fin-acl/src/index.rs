//! Authorization index construction.
//!
//! Building an index walks one ACL container's subtree, reads every node
//! typed `acl:Authorization`, expands the groups those records name, and
//! folds the result into per-target grants. Group membership is fetched once
//! per distinct group per build; nothing is kept between builds.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use futures::stream::{self, StreamExt, TryStreamExt};

use fin_client::Store;
use fin_core::ResourcePath;
use fin_graph::vocab;

use crate::model::{AuthorizationIndex, AuthorizationRecord, Grants, Mode};
use crate::service::AclService;
use crate::Result;

/// Current members of each group, keyed by group path.
pub type GroupMembers = BTreeMap<ResourcePath, Vec<String>>;

impl<S: Store> AclService<S> {
    /// Index every authorization record under `acl`.
    ///
    /// A missing container yields an empty index.
    pub async fn build_index(&self, acl: &ResourcePath) -> Result<AuthorizationIndex> {
        let Some(records) = self.records(acl).await? else {
            tracing::warn!(acl = %acl, "ACL container not found; nothing to index");
            return Ok(AuthorizationIndex::empty(acl.clone()));
        };
        let members = self.group_members(&records).await?;
        let index = index_records(acl, &records, &members);
        tracing::debug!(
            acl = %acl,
            records = records.len(),
            groups = members.len(),
            targets = index.entries.len(),
            "Built authorization index"
        );
        Ok(index)
    }

    /// Complete authorization records under `acl`, `None` when it is missing.
    ///
    /// Children are fetched level by level; each level's requests run
    /// concurrently, at most `max_concurrent_requests` at a time.
    pub async fn records(&self, acl: &ResourcePath) -> Result<Option<Vec<AuthorizationRecord>>> {
        let Some(graph) = self.fetch_graph("read acl container", acl).await? else {
            return Ok(None);
        };

        let mut visited: HashSet<ResourcePath> = HashSet::from([acl.clone()]);
        let mut frontier = self.children_of(acl, &graph, &mut visited);
        let mut records = Vec::new();

        while !frontier.is_empty() {
            let graphs: Vec<_> = stream::iter(&frontier)
                .map(|child| self.fetch_graph("read acl child", child))
                .buffered(self.concurrency())
                .try_collect()
                .await?;

            let mut next = Vec::new();
            for (child, graph) in frontier.into_iter().zip(graphs) {
                let Some(graph) = graph else {
                    tracing::debug!(path = %child, "ACL child vanished during walk");
                    continue;
                };
                let iri = self.store.iri_for(&child);
                let node = graph.node(&iri);
                if let Some(record) =
                    AuthorizationRecord::from_node(child.clone(), &node, |iri| self.store.path_for(iri))
                {
                    records.push(record);
                }
                next.extend(self.children_of(&child, &graph, &mut visited));
            }
            frontier = next;
        }

        Ok(Some(records))
    }

    /// Fetch the members of every group the records reference.
    pub async fn group_members(&self, records: &[AuthorizationRecord]) -> Result<GroupMembers> {
        let groups: BTreeSet<&ResourcePath> = records
            .iter()
            .flat_map(|record| record.agent_classes.iter())
            .collect();

        let fetched: Vec<_> = stream::iter(&groups)
            .map(|group| self.members_of(group))
            .buffered(self.concurrency())
            .try_collect()
            .await?;
        Ok(groups.into_iter().cloned().zip(fetched).collect())
    }

    /// Member ids of one group; a missing group has none.
    async fn members_of(&self, group: &ResourcePath) -> Result<Vec<String>> {
        let Some(graph) = self.fetch_graph("read group", group).await? else {
            tracing::warn!(group = %group, "Referenced group not found; treating as empty");
            return Ok(Vec::new());
        };
        let iri = self.store.iri_for(group);
        let node = graph.node(&iri);
        if !node.has_type(vocab::foaf::GROUP) {
            tracing::debug!(group = %group, "agentClass target is not typed foaf:Group");
        }

        let mut members: Vec<String> = Vec::new();
        for member in node.members() {
            let id = member.value().to_string();
            if !members.contains(&id) {
                members.push(id);
            }
        }
        Ok(members)
    }

    fn children_of(
        &self,
        parent: &ResourcePath,
        graph: &fin_graph::Graph,
        visited: &mut HashSet<ResourcePath>,
    ) -> Vec<ResourcePath> {
        graph
            .node(&self.store.iri_for(parent))
            .contains()
            .into_iter()
            .filter_map(|iri| self.store.path_for(iri))
            .filter(|child| visited.insert(child.clone()))
            .collect()
    }
}

/// Fold records into per-target grants.
///
/// Every target a record names gets a provenance entry for that record, even
/// when its groups are currently empty.
pub fn index_records(
    acl: &ResourcePath,
    records: &[AuthorizationRecord],
    members: &GroupMembers,
) -> AuthorizationIndex {
    let mut index = AuthorizationIndex::empty(acl.clone());

    for record in records {
        let mut agents: Vec<&str> = record.agents.iter().map(|a| a.key()).collect();
        for group in &record.agent_classes {
            if let Some(ids) = members.get(group) {
                agents.extend(ids.iter().map(String::as_str));
            }
        }

        for target in &record.access_to {
            let entry = index.entries.entry(target.clone()).or_default();
            let provenance = entry.authorizations.entry(record.path.clone()).or_default();
            grant(provenance, &agents, &record.modes);
            grant(&mut entry.authorization, &agents, &record.modes);
        }
    }
    index
}

fn grant(grants: &mut Grants, agents: &[&str], modes: &BTreeSet<Mode>) {
    for agent in agents {
        let granted = grants.entry((*agent).to_string()).or_default();
        for mode in modes {
            granted.insert(*mode, true);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
