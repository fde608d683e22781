//! Access-control data model.
//!
//! Grants are nested maps `agent -> mode -> true`, matching the JSON shape
//! consumers expect. Only `true` is ever stored; a missing key means "not
//! granted".

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fin_core::ResourcePath;
use fin_graph::{Node, Term, vocab};

use crate::{Error, Result};

/// Agent key matching every requester, including unauthenticated ones.
pub const PUBLIC_AGENT: &str = vocab::foaf::AGENT;

/// Agent key to granted modes.
pub type Grants = BTreeMap<String, BTreeMap<Mode, bool>>;

// ============================================================================
// Mode
// ============================================================================

/// An access mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// `acl:Read`
    Read,
    /// `acl:Write`
    Write,
}

impl Mode {
    /// Every mode, in letter order.
    pub const ALL: [Mode; 2] = [Mode::Read, Mode::Write];

    /// The `acl:` IRI.
    pub fn iri(&self) -> &'static str {
        match self {
            Mode::Read => vocab::acl::READ,
            Mode::Write => vocab::acl::WRITE,
        }
    }

    /// Parse an `acl:` mode IRI; other modes are not modeled.
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.iri() == iri)
    }

    /// Single letter used in synthesized record paths.
    pub fn letter(&self) -> char {
        match self {
            Mode::Read => 'r',
            Mode::Write => 'w',
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => f.write_str("Read"),
            Mode::Write => f.write_str("Write"),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "read" | "r" => Ok(Mode::Read),
            "write" | "w" => Ok(Mode::Write),
            _ => Self::from_iri(s)
                .ok_or_else(|| Error::invalid_argument(format!("unknown mode: {s}"))),
        }
    }
}

/// Letters of a mode set in canonical order (`r`, `w`, `rw`).
pub fn mode_letters(modes: &BTreeSet<Mode>) -> String {
    modes.iter().map(Mode::letter).collect()
}

// ============================================================================
// Agents
// ============================================================================

/// An agent named directly by a record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRef {
    /// A user id, IRI or literal.
    User(String),
    /// Everyone.
    Public,
}

impl AgentRef {
    /// Classify an `acl:agent` value.
    pub fn from_term(term: &Term) -> Self {
        match term.value() {
            PUBLIC_AGENT => AgentRef::Public,
            value => AgentRef::User(value.to_string()),
        }
    }

    /// The key this agent occupies in [`Grants`].
    pub fn key(&self) -> &str {
        match self {
            AgentRef::User(id) => id,
            AgentRef::Public => PUBLIC_AGENT,
        }
    }
}

/// Who a new authorization record grants access to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grantee {
    /// One user, written as an `acl:agent` literal.
    User(String),
    /// A group, written as `acl:agentClass <group>`.
    Group(ResourcePath),
    /// Everyone, written as `acl:agentClass foaf:Agent`.
    Public,
}

impl Grantee {
    /// Path segment distinguishing the grantee kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Grantee::User(_) => "u",
            Grantee::Group(_) => "g",
            Grantee::Public => "p",
        }
    }

    /// Path-safe label naming the grantee.
    pub fn label(&self) -> String {
        match self {
            Grantee::User(id) => escape_segment(id),
            Grantee::Group(path) => escape_segment(path.relative()),
            Grantee::Public => "public".to_string(),
        }
    }
}

/// Percent-escape the characters a label cannot carry inside one path segment.
pub(crate) fn escape_segment(label: &str) -> String {
    if label.is_empty() || label.chars().all(|c| c == '.') {
        return label.replace('.', "%2E");
    }
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            c if c.is_ascii_whitespace() => out.push_str(&format!("%{:02X}", c as u8)),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// Records and groups
// ============================================================================

/// One authorization record as declared in an ACL container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRecord {
    /// Where the record lives
    pub path: ResourcePath,
    /// Governed targets
    pub access_to: Vec<ResourcePath>,
    /// Agents named directly
    pub agents: Vec<AgentRef>,
    /// Groups named by `acl:agentClass`
    pub agent_classes: Vec<ResourcePath>,
    /// Granted modes
    pub modes: BTreeSet<Mode>,
}

impl AuthorizationRecord {
    /// Read a record node, mapping IRIs to paths with `path_for`.
    ///
    /// Returns `None` when the node is not typed `acl:Authorization` or lacks
    /// targets, grantees or known modes. `acl:agentClass foaf:Agent` is read
    /// as the public agent.
    pub fn from_node<F>(path: ResourcePath, node: &Node<'_>, path_for: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<ResourcePath>,
    {
        if !node.has_type(vocab::acl::AUTHORIZATION) {
            return None;
        }

        let access_to: Vec<ResourcePath> = node
            .access_to()
            .into_iter()
            .filter_map(|iri| {
                let target = path_for(iri);
                if target.is_none() {
                    tracing::warn!(record = %path, target = iri, "Ignoring foreign accessTo target");
                }
                target
            })
            .collect();

        let mut agents: Vec<AgentRef> = Vec::new();
        for agent in node.agents().into_iter().map(AgentRef::from_term) {
            if !agents.contains(&agent) {
                agents.push(agent);
            }
        }

        let mut agent_classes = Vec::new();
        for class in node.agent_classes() {
            if class == PUBLIC_AGENT {
                if !agents.contains(&AgentRef::Public) {
                    agents.push(AgentRef::Public);
                }
            } else if let Some(group) = path_for(class) {
                if !agent_classes.contains(&group) {
                    agent_classes.push(group);
                }
            } else {
                tracing::warn!(record = %path, class, "Ignoring foreign agentClass");
            }
        }

        let modes: BTreeSet<Mode> = node
            .modes()
            .into_iter()
            .filter_map(Mode::from_iri)
            .collect();

        if access_to.is_empty() || (agents.is_empty() && agent_classes.is_empty()) || modes.is_empty()
        {
            tracing::debug!(record = %path, "Skipping incomplete authorization record");
            return None;
        }

        Some(Self {
            path,
            access_to,
            agents,
            agent_classes,
            modes,
        })
    }

    /// Whether the record names `agent` directly or grants public access.
    pub fn names_agent(&self, agent: &str) -> bool {
        self.agents
            .iter()
            .any(|a| matches!(a, AgentRef::Public) || a.key() == agent)
    }
}

/// A group and its current members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Group path
    pub path: ResourcePath,
    /// `rdfs:label`, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Member ids, in stored order
    pub members: Vec<String>,
}

/// What a membership change actually did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MembershipChange {
    /// Members that were added
    pub added: Vec<String>,
    /// Members that were removed
    pub removed: Vec<String>,
}

impl MembershipChange {
    /// Whether the group was left untouched.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Groups listing an agent and the records that apply to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgentRoles {
    /// Groups the agent belongs to
    pub groups: Vec<ResourcePath>,
    /// Records granting the agent access directly, publicly, or via a group
    pub authorizations: Vec<AuthorizationRecord>,
}

// ============================================================================
// Index and result
// ============================================================================

/// Grants for one target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Grants per contributing record
    pub authorizations: BTreeMap<ResourcePath, Grants>,
    /// Union over every record
    pub authorization: Grants,
}

/// Per-target grants declared by one ACL container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationIndex {
    /// The indexed ACL container
    pub acl: ResourcePath,
    /// Entries keyed by target
    pub entries: BTreeMap<ResourcePath, IndexEntry>,
}

impl AuthorizationIndex {
    /// An index with no entries.
    pub fn empty(acl: ResourcePath) -> Self {
        Self {
            acl,
            entries: BTreeMap::new(),
        }
    }

    /// The entry for `target`.
    pub fn get(&self, target: &ResourcePath) -> Option<&IndexEntry> {
        self.entries.get(target)
    }

    /// Whether no target has an entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The effective grants on one path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveAuthorization {
    /// Union of every applicable grant
    pub authorization: Grants,
    /// Grants per contributing record
    pub authorizations: BTreeMap<ResourcePath, Grants>,
    /// Linked ACL containers, in discovery order
    pub defined_at: Vec<ResourcePath>,
}

impl EffectiveAuthorization {
    /// Whether nothing applies.
    pub fn is_empty(&self) -> bool {
        self.authorization.is_empty() && self.authorizations.is_empty() && self.defined_at.is_empty()
    }

    /// Modes granted to `agent`, ignoring public grants.
    pub fn modes_for(&self, agent: &str) -> BTreeSet<Mode> {
        self.authorization
            .get(agent)
            .map(|modes| modes.iter().filter(|(_, v)| **v).map(|(m, _)| *m).collect())
            .unwrap_or_default()
    }

    /// Whether `agent` (or an anonymous requester when `None`) may use `mode`.
    pub fn allows(&self, agent: Option<&str>, mode: Mode) -> bool {
        let granted = |key: &str| {
            self.authorization
                .get(key)
                .and_then(|modes| modes.get(&mode))
                .copied()
                .unwrap_or(false)
        };
        granted(PUBLIC_AGENT) || agent.is_some_and(granted)
    }
}

// ============================================================================
// Tests
// ============================================================================
