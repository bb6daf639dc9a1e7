//! Data structures for the content graph: nodes, edges, and the level taxonomy.

pub mod edge;
pub mod node;

pub use edge::{Edge, EdgeKind};
pub use node::{
    level_color, level_label, CardStatus, DisplayConfig, Node, NodePatch, Subtitle,
    ValidationError, FALLBACK_COLOR, LEVEL_COLORS,
};
