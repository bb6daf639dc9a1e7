//! In-Memory Graph Store
//!
//! Authoritative mapping from node id to node record; the single source of
//! truth for structure. The store is a pure lookup surface — every write goes
//! through [`GraphService`](crate::services::GraphService) so the structural
//! invariants are enforced at one choke point.
//!
//! Nodes are held in an insertion-ordered map, which is what makes sibling
//! tie-breaking ("equal `order`, original insertion order wins") stable.

use indexmap::IndexMap;

use crate::models::Node;

/// Insertion-ordered node store, scoped to one editing session.
///
/// Lifecycle: hydrated once from a snapshot, mutated by `GraphService`,
/// snapshotted back out, then discarded with the session.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<String, Node>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Root nodes (no parent) in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.parent_id.is_none())
    }

    /// Children of a node, in the parent's `children` list order.
    ///
    /// Ids in the list that no longer resolve are skipped; the mutation layer
    /// never leaves such ids behind.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        match self.nodes.get(id) {
            Some(parent) => parent
                .children
                .iter()
                .filter_map(|child_id| self.nodes.get(child_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Parent of a node, if it has one.
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        let parent_id = self.nodes.get(id)?.parent_id.as_deref()?;
        self.nodes.get(parent_id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Insert a node, returning the previous record when the id was taken.
    pub(crate) fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Remove a node record. Relational cleanup is the caller's job.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.shift_remove(id)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}
