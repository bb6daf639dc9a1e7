//! Tree Layout Engine
//!
//! Pure function from the current forest structure to a coordinate for every
//! node — a centered tidy-tree. No hidden state: the same structure and
//! `order` values always produce the same positions, prior coordinates are
//! never consulted, and recomputing on every render accumulates no drift.
//!
//! The algorithm is two recursive passes per tree:
//!
//! 1. `subtree_width` — a leaf occupies [`NODE_WIDTH`]; an inner node occupies
//!    the sum of its children's subtree widths plus gutters, never less than
//!    [`NODE_WIDTH`].
//! 2. `place` — a node sits at its given `(x, y)`; its children are sorted by
//!    `order` ascending (stable, so equal orders keep insertion order — the
//!    sibling set is sorted before positioning, not iterated in storage
//!    order) and spread symmetrically under it, one [`VERTICAL_SPACING`] row
//!    down.
//!
//! Roots are laid out left to right, each centered over its own subtree
//! width, at a fixed top margin.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Node;
use crate::store::GraphStore;

/// On-screen width of a card.
pub const NODE_WIDTH: f64 = 256.0;

/// Gap between adjacent sibling footprints.
const H_GUTTER: f64 = 44.0;

/// Horizontal pitch between sibling slots.
pub const HORIZONTAL_SPACING: f64 = NODE_WIDTH + H_GUTTER;

/// Vertical distance between a node and its children's row.
pub const VERTICAL_SPACING: f64 = 200.0;

/// Y coordinate of the root row.
pub const TOP_MARGIN: f64 = 50.0;

/// A node's assigned canvas position (center-x of the card, top-y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Compute coordinates for every node in the store.
pub fn compute(store: &GraphStore) -> HashMap<String, Point> {
    let mut positions = HashMap::with_capacity(store.len());
    let mut cursor = 0.0;
    for root in store.roots() {
        let width = subtree_width(store, root);
        place(store, root, cursor + width / 2.0, TOP_MARGIN, &mut positions);
        cursor += width + HORIZONTAL_SPACING;
    }
    positions
}

/// Horizontal footprint of a node's subtree.
fn subtree_width(store: &GraphStore, node: &Node) -> f64 {
    let children = sorted_children(store, node);
    if children.is_empty() {
        return NODE_WIDTH;
    }
    let total: f64 = children
        .iter()
        .map(|child| subtree_width(store, child))
        .sum::<f64>()
        + (children.len() - 1) as f64 * HORIZONTAL_SPACING;
    total.max(NODE_WIDTH)
}

fn place(
    store: &GraphStore,
    node: &Node,
    x: f64,
    y: f64,
    positions: &mut HashMap<String, Point>,
) {
    positions.insert(node.id.clone(), Point { x, y });

    let children = sorted_children(store, node);
    if children.is_empty() {
        return;
    }

    let total: f64 = children
        .iter()
        .map(|child| subtree_width(store, child))
        .sum::<f64>()
        + (children.len() - 1) as f64 * HORIZONTAL_SPACING;

    let mut child_x = x - total / 2.0 + NODE_WIDTH / 2.0;
    for child in children {
        place(store, child, child_x, y + VERTICAL_SPACING, positions);
        child_x += subtree_width(store, child) + HORIZONTAL_SPACING;
    }
}

/// Children in layout order: ascending `order`, stable tie-break on the
/// parent's list order (which is insertion order).
fn sorted_children<'a>(store: &'a GraphStore, node: &Node) -> Vec<&'a Node> {
    let mut children = store.children_of(&node.id);
    children.sort_by(|a, b| a.order.total_cmp(&b.order));
    children
}
