//! Storage layer: the in-memory, insertion-ordered node store.

pub mod graph_store;

pub use graph_store::GraphStore;
