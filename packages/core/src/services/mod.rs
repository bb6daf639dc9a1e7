//! Business services: the mutation engine and the edge synchronizer.

pub mod edge_sync;
pub mod error;
pub mod graph_service;

pub use edge_sync::EdgeSynchronizer;
pub use error::GraphError;
pub use graph_service::{CreateNodeParams, GraphService};
