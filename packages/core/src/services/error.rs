//! Service Layer Error Types
//!
//! Error taxonomy for graph operations. Structural errors (`ValidationFailed`,
//! `NodeNotFound`, `Cycle`) are raised synchronously from the mutation call and
//! never leave partial state behind. `Persistence` is raised asynchronously
//! after a mutation has already committed locally and never reverses it.

use crate::models::ValidationError;

/// Graph operation errors
///
/// All variants are recoverable at the call site; none is fatal to the
/// process.
// Display/Error/From are hand-written below: thiserror's derive treats any
// field named `source` as the error source, and `EdgeNotFound::source` is a
// node id (String), not an error.
#[derive(Debug)]
pub enum GraphError {
    /// Operation referenced an unknown node id
    NodeNotFound { id: String },

    /// Operation referenced an edge or relation that does not exist
    EdgeNotFound { source: String, target: String },

    /// Validation failed for a node payload
    ValidationFailed(ValidationError),

    /// Reparenting would make a node its own ancestor
    Cycle { child_id: String, parent_id: String },

    /// Snapshot save/load failed; in-memory structure is retained as-is
    Persistence(String),

    /// Snapshot encode/decode error
    Serialization(String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound { id } => write!(f, "Node not found: {id}"),
            Self::EdgeNotFound { source, target } => {
                write!(f, "Edge not found: {source} -> {target}")
            }
            Self::ValidationFailed(err) => write!(f, "Node validation failed: {err}"),
            Self::Cycle { child_id, parent_id } => write!(
                f,
                "Cannot make '{parent_id}' the parent of '{child_id}': it is a descendant"
            ),
            Self::Persistence(msg) => write!(f, "Persistence failed: {msg}"),
            Self::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for GraphError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationFailed(err)
    }
}

impl GraphError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create an edge not found error
    pub fn edge_not_found(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::EdgeNotFound {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Create a cycle error
    pub fn cycle(child_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::Cycle {
            child_id: child_id.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
