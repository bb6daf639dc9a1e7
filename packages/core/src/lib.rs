//! Cardflow Core Engine
//!
//! Consistency-and-layout engine for a small (≤4-level) hierarchical content
//! graph: a forest of topic cards with parent/child relations, plus two
//! derived views — a visual edge list and on-screen coordinates — kept in
//! lockstep as an operator edits the tree.
//!
//! # Architecture
//!
//! - **Flat canonical representation**: one node-by-id map plus ordered
//!   child-id lists; nested external shapes are flattened at the load boundary
//! - **Single mutation choke point**: all writes go through
//!   [`GraphService`](services::GraphService), which enforces the structural
//!   invariants and keeps edges synchronized
//! - **Pure layout**: [`layout::compute`] derives coordinates from structure
//!   and `order` values alone, idempotently
//! - **Best-effort persistence**: full snapshots flow to a
//!   [`SnapshotGateway`](persistence::SnapshotGateway) asynchronously,
//!   last-write-wins, never rolling back memory
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Edge, level taxonomy)
//! - [`store`] - In-memory insertion-ordered node store
//! - [`services`] - Mutation engine and edge synchronizer
//! - [`layout`] - Centered tidy-tree layout
//! - [`events`] - Domain event broadcast
//! - [`persistence`] - Snapshot formats, gateway trait, HTTP endpoint

pub mod events;
pub mod layout;
pub mod models;
pub mod persistence;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use events::GraphEvent;
pub use models::{Edge, Node, NodePatch};
pub use persistence::{FileSnapshotGateway, SnapshotGateway, SnapshotRecord};
pub use services::{CreateNodeParams, GraphError, GraphService};
pub use store::GraphStore;
