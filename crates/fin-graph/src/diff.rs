//! Set-based graph diff.
//!
//! A patch is the symmetric difference between two triple sets, split into
//! the triples to delete and the triples to insert. Diffing sets rather than
//! serialized text means blank-node labels and ordering never produce
//! spurious changes for IRI-only graphs.

use crate::Graph;

/// Triples to remove and triples to add.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphPatch {
    /// Present in the old graph only.
    pub deletes: Graph,
    /// Present in the new graph only.
    pub inserts: Graph,
}

impl GraphPatch {
    /// The minimal patch turning `old` into `new`.
    pub fn diff(old: &Graph, new: &Graph) -> Self {
        let patch = Self {
            deletes: old.difference(new),
            inserts: new.difference(old),
        };
        log::debug!(
            "Graph diff: {} deletes, {} inserts",
            patch.deletes.len(),
            patch.inserts.len()
        );
        patch
    }

    /// A patch that only inserts.
    pub fn insert(graph: Graph) -> Self {
        Self {
            deletes: Graph::new(),
            inserts: graph,
        }
    }

    /// A patch that only deletes.
    pub fn delete(graph: Graph) -> Self {
        Self {
            deletes: graph,
            inserts: Graph::new(),
        }
    }

    /// Whether applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty()
    }

    /// Total number of triple operations.
    pub fn len(&self) -> usize {
        self.deletes.len() + self.inserts.len()
    }

    /// Apply deletes, then inserts.
    pub fn apply(&self, graph: &mut Graph) {
        for triple in &self.deletes {
            graph.remove(triple);
        }
        graph.extend(self.inserts.iter().cloned());
    }

    /// The patch that undoes this one.
    pub fn invert(&self) -> Self {
        Self {
            deletes: self.inserts.clone(),
            inserts: self.deletes.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
