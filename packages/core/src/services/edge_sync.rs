//! Edge Synchronizer
//!
//! The single place where edges and parent/child relations are kept in
//! bijection. Every structural mutation routes its edge delta through here, so
//! the work per operation stays O(1) amortized instead of rebuilding the full
//! edge set. Edge ids are derived from `(source, target)`, which makes
//! re-synchronization idempotent: syncing the same relation twice can never
//! produce a duplicate edge.
//!
//! Explicit user-drawn connections that do not correspond to a relation are
//! tolerated as extra non-tree edges. They are never reflected back into
//! `parent_id`/`children`; only the "connect as child" gesture does that, via
//! `GraphService::add_child`.

use indexmap::IndexMap;

use crate::models::{Edge, EdgeKind, Node};
use crate::store::GraphStore;

/// Maintains the derived edge set for the graph.
#[derive(Debug, Default)]
pub struct EdgeSynchronizer {
    edges: IndexMap<String, Edge>,
}

impl EdgeSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The edge between two node ids, if any.
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges.get(&Edge::id_for(source, target))
    }

    /// Record the edge for a new parent/child relation.
    ///
    /// Upgrades an existing explicit connection between the same pair in
    /// place, which is what the "connect as child" gesture produces.
    pub(crate) fn insert_relation(&mut self, parent: &Node, child: &Node) {
        let edge = Edge::relation(parent, child);
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Record an explicit user-drawn connection.
    ///
    /// Does not overwrite an existing relation edge between the same pair —
    /// the relation already implies the connection.
    pub(crate) fn insert_connection(
        &mut self,
        source: &Node,
        target: &Node,
        source_slot: Option<usize>,
        target_slot: Option<usize>,
    ) -> String {
        let id = Edge::id_for(&source.id, &target.id);
        if let Some(existing) = self.edges.get(&id) {
            if existing.kind == EdgeKind::Relation {
                return id;
            }
        }
        let edge = Edge::connection(source, target, source_slot, target_slot);
        self.edges.insert(id.clone(), edge);
        id
    }

    /// Remove the edge between two node ids, if present.
    pub(crate) fn remove_between(&mut self, source: &str, target: &str) -> Option<Edge> {
        self.edges.shift_remove(&Edge::id_for(source, target))
    }

    /// Remove every edge where the id is source or target; returns the count.
    pub(crate) fn remove_touching(&mut self, id: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|_, edge| !edge.touches(id));
        before - self.edges.len()
    }

    /// Reassign fan-out slots for a parent's relation edges.
    ///
    /// With 2+ children each relation edge gets its own connection-point index
    /// (the child's position in the `children` list) so the fan-out does not
    /// overlap visually; with a single child the slot is cleared.
    pub(crate) fn reslot(&mut self, parent: &Node) {
        let fan_out = parent.children.len() > 1;
        for (index, child_id) in parent.children.iter().enumerate() {
            if let Some(edge) = self.edges.get_mut(&Edge::id_for(&parent.id, child_id)) {
                if edge.kind == EdgeKind::Relation {
                    edge.source_slot = fan_out.then_some(index);
                }
            }
        }
    }

    /// Rebuild the whole edge set from the store's relations.
    ///
    /// Used once at the hydration boundary; per-mutation maintenance is
    /// delta-based. Explicit connections are dropped (they are not part of a
    /// snapshot).
    pub(crate) fn rebuild(&mut self, store: &GraphStore) {
        self.edges.clear();
        for parent in store.list() {
            for child in store.children_of(&parent.id) {
                self.insert_relation(parent, child);
            }
            if let Some(parent) = store.get(&parent.id) {
                self.reslot(parent);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, level: u8) -> Node {
        let mut node = Node::new(level, format!("node {}", id), 0.0);
        node.id = id.to_string();
        node
    }

    #[test]
    fn test_insert_relation_is_idempotent() {
        let mut sync = EdgeSynchronizer::new();
        let parent = node("p", 1);
        let child = node("c", 2);

        sync.insert_relation(&parent, &child);
        sync.insert_relation(&parent, &child);

        assert_eq!(sync.len(), 1);
        assert!(sync.edge_between("p", "c").is_some());
    }

    #[test]
    fn test_connection_does_not_downgrade_relation() {
        let mut sync = EdgeSynchronizer::new();
        let parent = node("p", 1);
        let child = node("c", 2);

        sync.insert_relation(&parent, &child);
        sync.insert_connection(&parent, &child, Some(1), None);

        let edge = sync.edge_between("p", "c").unwrap();
        assert_eq!(edge.kind, EdgeKind::Relation);
    }

    #[test]
    fn test_relation_upgrades_connection() {
        let mut sync = EdgeSynchronizer::new();
        let parent = node("p", 1);
        let child = node("c", 2);

        sync.insert_connection(&parent, &child, None, None);
        sync.insert_relation(&parent, &child);

        assert_eq!(sync.len(), 1);
        assert_eq!(sync.edge_between("p", "c").unwrap().kind, EdgeKind::Relation);
    }

    #[test]
    fn test_remove_touching_drops_both_directions() {
        let mut sync = EdgeSynchronizer::new();
        let a = node("a", 1);
        let b = node("b", 2);
        let c = node("c", 2);

        sync.insert_relation(&a, &b);
        sync.insert_relation(&b, &c);
        sync.insert_relation(&a, &c);

        let removed = sync.remove_touching("b");
        assert_eq!(removed, 2);
        assert_eq!(sync.len(), 1);
        assert!(sync.edge_between("a", "c").is_some());
    }

    #[test]
    fn test_reslot_assigns_indices_only_on_fan_out() {
        let mut sync = EdgeSynchronizer::new();
        let mut parent = node("p", 1);
        let c1 = node("c1", 2);
        let c2 = node("c2", 2);

        parent.children = vec!["c1".to_string()];
        sync.insert_relation(&parent, &c1);
        sync.reslot(&parent);
        assert_eq!(sync.edge_between("p", "c1").unwrap().source_slot, None);

        parent.children = vec!["c1".to_string(), "c2".to_string()];
        sync.insert_relation(&parent, &c2);
        sync.reslot(&parent);
        assert_eq!(sync.edge_between("p", "c1").unwrap().source_slot, Some(0));
        assert_eq!(sync.edge_between("p", "c2").unwrap().source_slot, Some(1));
    }
}
