//! Administrative mutations.
//!
//! Multi-step operations record each completed step and, on failure, report
//! them in [`Error::Partial`] so the caller can resume instead of restarting.
//! No step is retried here.

use std::collections::BTreeSet;

use fin_client::{Method, Store};
use fin_core::ResourcePath;
use fin_graph::{Graph, GraphPatch, Term, sparql, vocab};

use crate::error::Step;
use crate::model::{Grantee, Group, MembershipChange, Mode, PUBLIC_AGENT, mode_letters};
use crate::service::{AclService, expect_success};
use crate::{Error, Result};

// ============================================================================
// Options
// ============================================================================

/// Arguments for [`AclService::create_acl`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateAcl {
    /// Resource the container will govern
    pub target: ResourcePath,
    /// Optional `rdfs:label`
    pub label: Option<String>,
    /// Container name under the target; the configured name when `None`
    pub container_name: Option<String>,
}

impl CreateAcl {
    /// Create `<target>/<configured name>` without a label.
    pub fn new(target: ResourcePath) -> Self {
        Self {
            target,
            label: None,
            container_name: None,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Use a container name other than the configured one.
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }
}

/// Arguments for [`AclService::add_authorization`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddAuthorization {
    /// Resource being granted
    pub target: ResourcePath,
    /// Who receives the grant
    pub grantee: Grantee,
    /// Granted modes
    pub modes: BTreeSet<Mode>,
    /// ACL container to write into; the first linked one when `None`
    pub acl: Option<ResourcePath>,
}

impl AddAuthorization {
    /// Grant `modes` on `target` to `grantee`.
    pub fn new(target: ResourcePath, grantee: Grantee, modes: impl IntoIterator<Item = Mode>) -> Self {
        Self {
            target,
            grantee,
            modes: modes.into_iter().collect(),
            acl: None,
        }
    }

    /// Write into a specific ACL container.
    pub fn in_acl(mut self, acl: ResourcePath) -> Self {
        self.acl = Some(acl);
        self
    }
}

/// Arguments for [`AclService::create_group`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateGroup {
    /// Container the group is created under
    pub parent: ResourcePath,
    /// Group name (one or more path segments)
    pub name: String,
    /// Optional `rdfs:label`
    pub label: Option<String>,
    /// Initial members
    pub members: Vec<String>,
}

impl CreateGroup {
    /// A group `parent/name` with the given members.
    pub fn new(parent: ResourcePath, name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            parent,
            name: name.into(),
            label: None,
            members,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Arguments for [`AclService::modify_group_members`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifyGroupMembers {
    /// Group to change
    pub group: ResourcePath,
    /// Members to add; existing ones are skipped
    pub add: Vec<String>,
    /// Members to remove; absent ones are ignored
    pub remove: Vec<String>,
}

impl ModifyGroupMembers {
    /// Add `members` to `group`.
    pub fn add(group: ResourcePath, members: Vec<String>) -> Self {
        Self {
            group,
            add: members,
            remove: Vec::new(),
        }
    }

    /// Remove `members` from `group`.
    pub fn remove(group: ResourcePath, members: Vec<String>) -> Self {
        Self {
            group,
            add: Vec::new(),
            remove: members,
        }
    }
}

/// Path of the record granting `modes` on `target` to `grantee`, relative to
/// its ACL container.
///
/// Distinct (grantee, target, modes) triples never share a path.
pub fn record_slug(grantee: &Grantee, target: &ResourcePath, modes: &BTreeSet<Mode>) -> String {
    let label = grantee.label();
    let letters = mode_letters(modes);
    [grantee.kind(), label.as_str(), target.relative(), letters.as_str()]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn document() -> Term {
    Term::iri("")
}

// ============================================================================
// ACL containers and records
// ============================================================================

impl<S: Store> AclService<S> {
    /// Create an ACL container for a target and link the target to it.
    ///
    /// The container is created at `<target>/<name>` by POSTing to the
    /// repository root, then the target is patched to advertise it. When the
    /// link fails the error is `Partial` with the creation as its completed
    /// step; [`AclService::link_acl`] finishes the job.
    pub async fn create_acl(&self, options: CreateAcl) -> Result<ResourcePath> {
        let target = &options.target;
        let name = options
            .container_name
            .as_deref()
            .unwrap_or(&self.config.container_name);
        let acl = target.join(name)?;

        self.require_exists("ACL target", "check acl target", target)
            .await?;
        if self.exists("check acl container", &acl).await? {
            return Err(Error::conflict(&acl));
        }

        let mut body = Graph::new();
        if let Some(label) = &options.label {
            body.insert(document(), vocab::rdfs::LABEL, Term::literal(label.as_str()));
        }
        self.create_at_root("create acl container", &acl, &body)
            .await?;
        tracing::info!(acl = %acl, target = %target, "Created ACL container");

        let completed = vec![Step::Created { path: acl.clone() }];
        if let Err(e) = self.link_acl(target, &acl).await {
            return Err(Error::partial("create acl", completed, e));
        }
        Ok(acl)
    }

    /// Make `target` advertise `acl`. Returns `false` when it already did.
    pub async fn link_acl(&self, target: &ResourcePath, acl: &ResourcePath) -> Result<bool> {
        let graph = self
            .fetch_graph("read link target", target)
            .await?
            .ok_or_else(|| Error::not_found("ACL target", target))?;

        let iri = self.store.iri_for(target);
        let acl_iri = self.store.iri_for(acl);
        if graph.node(&iri).access_controls().contains(&acl_iri.as_str()) {
            tracing::debug!(target = %target, acl = %acl, "Target already linked");
            return Ok(false);
        }

        let mut link = Graph::new();
        link.insert(Term::iri(iri.as_str()), vocab::acl::ACCESS_CONTROL, Term::iri(acl_iri));
        let update = sparql::to_update(&GraphPatch::insert(link), Some(&iri))?;
        let response = self.store.patch(target, &update).await?;
        expect_success("link acl", Method::Patch, target, response)?;

        tracing::info!(target = %target, acl = %acl, "Linked ACL");
        Ok(true)
    }

    /// Write a new authorization record; returns its path.
    ///
    /// Without an explicit container the first ACL linked to the target is
    /// used. Several linked ACLs make that choice ambiguous and are logged.
    pub async fn add_authorization(&self, options: AddAuthorization) -> Result<ResourcePath> {
        if options.modes.is_empty() {
            return Err(Error::invalid_argument("at least one mode is required"));
        }
        if let Grantee::User(id) = &options.grantee
            && id.trim().is_empty()
        {
            return Err(Error::invalid_argument("user id must not be empty"));
        }

        let target = &options.target;
        let head = self
            .require_exists("authorization target", "check authorization target", target)
            .await?;
        let acl = match &options.acl {
            Some(acl) => acl.clone(),
            None => {
                let linked = self.acl_links(target, &head);
                match linked.as_slice() {
                    [] => return Err(Error::not_found("linked ACL", target)),
                    [first] => first.clone(),
                    [first, ..] => {
                        tracing::warn!(
                            target = %target,
                            acl = %first,
                            linked = linked.len(),
                            "Several ACLs linked; writing to the first"
                        );
                        first.clone()
                    }
                }
            }
        };

        let slug = record_slug(&options.grantee, target, &options.modes);
        let record = acl.join(&slug)?;
        let body = self.authorization_graph(target, &options.grantee, &options.modes);

        let response = self.store.post(&acl, &slug, &body).await?;
        match response.status {
            409 => return Err(Error::conflict(&record)),
            404 | 410 => return Err(Error::not_found("ACL container", &acl)),
            _ => {
                expect_success("create authorization", Method::Post, &acl, response)?;
            }
        }

        tracing::info!(
            record = %record,
            target = %target,
            modes = %mode_letters(&options.modes),
            "Added authorization"
        );
        Ok(record)
    }

    /// Delete one authorization record.
    pub async fn remove_authorization(&self, record: &ResourcePath) -> Result<()> {
        let graph = self
            .fetch_graph("read authorization", record)
            .await?
            .ok_or_else(|| Error::not_found("authorization", record))?;
        let iri = self.store.iri_for(record);
        if !graph.node(&iri).has_type(vocab::acl::AUTHORIZATION) {
            return Err(Error::invalid_argument(format!(
                "{record} is not an authorization record"
            )));
        }

        let response = self.store.delete(record).await?;
        expect_success("delete authorization", Method::Delete, record, response)?;
        tracing::info!(record = %record, "Removed authorization");
        Ok(())
    }

    pub(crate) fn authorization_graph(
        &self,
        target: &ResourcePath,
        grantee: &Grantee,
        modes: &BTreeSet<Mode>,
    ) -> Graph {
        let mut graph = Graph::new();
        graph.insert(document(), vocab::rdf::TYPE, Term::iri(vocab::acl::AUTHORIZATION));
        graph.insert(
            document(),
            vocab::acl::ACCESS_TO,
            Term::iri(self.store.iri_for(target)),
        );
        match grantee {
            Grantee::User(id) => {
                graph.insert(document(), vocab::acl::AGENT, Term::literal(id.as_str()));
            }
            Grantee::Group(group) => {
                graph.insert(
                    document(),
                    vocab::acl::AGENT_CLASS,
                    Term::iri(self.store.iri_for(group)),
                );
            }
            Grantee::Public => {
                graph.insert(document(), vocab::acl::AGENT_CLASS, Term::iri(PUBLIC_AGENT));
            }
        }
        for mode in modes {
            graph.insert(document(), vocab::acl::MODE, Term::iri(mode.iri()));
        }
        graph
    }

    /// POST `body` to the root with `path` as the slug.
    pub(crate) async fn create_at_root(
        &self,
        step: &'static str,
        path: &ResourcePath,
        body: &Graph,
    ) -> Result<()> {
        let root = ResourcePath::root();
        let response = self.store.post(&root, path.relative(), body).await?;
        if response.status == 409 {
            return Err(Error::conflict(path));
        }
        expect_success(step, Method::Post, &root, response)?;
        Ok(())
    }
}

// ============================================================================
// Groups
// ============================================================================

impl<S: Store> AclService<S> {
    /// Create a group; returns its path.
    pub async fn create_group(&self, options: CreateGroup) -> Result<ResourcePath> {
        let group = options.parent.join(&options.name)?;
        if group == options.parent {
            return Err(Error::invalid_argument("group name must not be empty"));
        }
        if self.exists("check group", &group).await? {
            return Err(Error::conflict(&group));
        }

        let mut body = Graph::new();
        body.insert(document(), vocab::rdf::TYPE, Term::iri(vocab::foaf::GROUP));
        if let Some(label) = &options.label {
            body.insert(document(), vocab::rdfs::LABEL, Term::literal(label.as_str()));
        }
        for member in &options.members {
            body.insert(document(), vocab::foaf::MEMBER, Term::literal(member.as_str()));
        }
        self.create_at_root("create group", &group, &body).await?;

        tracing::info!(group = %group, members = options.members.len(), "Created group");
        Ok(group)
    }

    /// Read a group's label and members.
    pub async fn get_group(&self, group: &ResourcePath) -> Result<Group> {
        let graph = self
            .fetch_graph("read group", group)
            .await?
            .ok_or_else(|| Error::not_found("group", group))?;
        let iri = self.store.iri_for(group);
        let node = graph.node(&iri);
        if !node.has_type(vocab::foaf::GROUP) {
            return Err(Error::invalid_argument(format!("{group} is not a group")));
        }

        let mut members: Vec<String> = Vec::new();
        for member in node.members() {
            if !members.iter().any(|m| m == member.value()) {
                members.push(member.value().to_string());
            }
        }
        Ok(Group {
            path: group.clone(),
            label: node.label().map(String::from),
            members,
        })
    }

    /// Add and remove group members with a minimal patch.
    ///
    /// Adding an existing member and removing an absent one are no-ops; when
    /// nothing changes no request is written. Calls for the same group made
    /// through one service run one at a time.
    pub async fn modify_group_members(
        &self,
        options: ModifyGroupMembers,
    ) -> Result<MembershipChange> {
        let group = &options.group;
        if let Some(both) = options.add.iter().find(|a| options.remove.contains(*a)) {
            return Err(Error::invalid_argument(format!(
                "{both} is both added and removed"
            )));
        }

        let _guard = self.locks.lock(group).await;

        let current = self
            .fetch_graph("read group", group)
            .await?
            .ok_or_else(|| Error::not_found("group", group))?;
        let iri = self.store.iri_for(group);
        if !current.node(&iri).has_type(vocab::foaf::GROUP) {
            return Err(Error::invalid_argument(format!("{group} is not a group")));
        }

        let subject = Term::iri(iri.as_str());
        let mut next = current.clone();
        let mut change = MembershipChange::default();

        for agent in &options.add {
            let present = next
                .objects(&subject, vocab::foaf::MEMBER)
                .any(|member| member.value() == agent);
            if !present {
                next.insert(subject.clone(), vocab::foaf::MEMBER, Term::literal(agent.as_str()));
                change.added.push(agent.clone());
            }
        }

        for agent in &options.remove {
            let matching: Vec<_> = next
                .about(&subject)
                .filter(|t| t.predicate == vocab::foaf::MEMBER && t.object.value() == agent)
                .cloned()
                .collect();
            if matching.is_empty() {
                continue;
            }
            for triple in &matching {
                next.remove(triple);
            }
            change.removed.push(agent.clone());
        }

        let patch = GraphPatch::diff(&current, &next);
        if patch.is_empty() {
            tracing::debug!(group = %group, "Membership unchanged");
            return Ok(change);
        }

        let update = sparql::to_update(&patch, Some(&iri))?;
        let response = self.store.patch(group, &update).await?;
        expect_success("patch group", Method::Patch, group, response)?;

        tracing::info!(
            group = %group,
            added = change.added.len(),
            removed = change.removed.len(),
            "Updated group membership"
        );
        Ok(change)
    }
}

// ============================================================================
// Tests
// ============================================================================
