//! Edge Data Structures
//!
//! Edges are a derived view: one edge per parent/child relation, plus any
//! explicit user-drawn connections. They are never persisted — the
//! [`EdgeSynchronizer`](crate::services::EdgeSynchronizer) rebuilds and
//! delta-maintains them from the relational pointers.

use serde::{Deserialize, Serialize};

use crate::models::node::level_color;
use crate::models::Node;

/// How an edge came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Mirrors a parent/child relation; removal must go through `remove_child`.
    Relation,
    /// Explicit user-drawn connection with no relational counterpart.
    Connection,
}

/// A directed visual connection between two node ids.
///
/// The id is deterministically derived from `(source, target)`, so
/// re-synchronizing the same relation is idempotent and can never produce
/// duplicate edges. The color is taken from the target (child) node's level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Display color, derived from the target node's level.
    pub color: String,
    /// Connection-point index on the source when it fans out to 2+ children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_slot: Option<usize>,
    /// Connection-point index on the target, used by explicit connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_slot: Option<usize>,
    pub kind: EdgeKind,
}

impl Edge {
    /// Deterministic edge id for a `(source, target)` pair.
    pub fn id_for(source: &str, target: &str) -> String {
        format!("edge-{}-{}", source, target)
    }

    /// Build an edge for a parent/child relation.
    pub fn relation(source: &Node, target: &Node) -> Self {
        Self {
            id: Self::id_for(&source.id, &target.id),
            source: source.id.clone(),
            target: target.id.clone(),
            color: level_color(target.level).to_string(),
            source_slot: None,
            target_slot: None,
            kind: EdgeKind::Relation,
        }
    }

    /// Build an explicit user-drawn connection.
    pub fn connection(
        source: &Node,
        target: &Node,
        source_slot: Option<usize>,
        target_slot: Option<usize>,
    ) -> Self {
        Self {
            id: Self::id_for(&source.id, &target.id),
            source: source.id.clone(),
            target: target.id.clone(),
            color: level_color(target.level).to_string(),
            source_slot,
            target_slot,
            kind: EdgeKind::Connection,
        }
    }

    /// Whether this edge touches the given node id as source or target.
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}
