//! Domain Events
//!
//! Events emitted by [`GraphService`](crate::services::GraphService) when the
//! graph changes. They follow the observer pattern over a tokio broadcast
//! channel so presentation layers can react to mutations without coupling to
//! the mutation engine.
//!
//! # Event Flow
//!
//! 1. `GraphService` applies a mutation to the store
//! 2. A domain event is emitted via the broadcast channel
//! 3. All subscribers receive the event asynchronously
//!
//! `SaveFailed` is the one asynchronous arrival: it is emitted by the
//! background saver task after the mutation has already committed locally,
//! and signals a recoverable, non-fatal persistence problem.

/// Broadcast channel capacity for domain events.
///
/// 128 provides headroom for burst operations (hydration, bulk edits) while
/// limiting memory overhead. Subscriber lag is acceptable — consumers track
/// current state, not event history.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Domain events emitted by the mutation engine.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// A new node was created
    NodeCreated { id: String },

    /// An existing node's non-relational fields were updated
    NodeUpdated { id: String },

    /// A node was deleted (its children were promoted to the grandparent)
    NodeDeleted { id: String },

    /// A node was reparented (`parent_id == None` means it became a root)
    ParentChanged {
        child_id: String,
        parent_id: Option<String>,
    },

    /// An explicit connection edge was drawn
    EdgeConnected { source: String, target: String },

    /// An explicit connection edge was removed
    EdgeDisconnected { source: String, target: String },

    /// A background snapshot save failed; in-memory state is unaffected
    SaveFailed { message: String },
}

impl GraphEvent {
    /// String representation of the event type, for logging and debugging.
    pub fn event_type(&self) -> &str {
        match self {
            GraphEvent::NodeCreated { .. } => "node:created",
            GraphEvent::NodeUpdated { .. } => "node:updated",
            GraphEvent::NodeDeleted { .. } => "node:deleted",
            GraphEvent::ParentChanged { .. } => "node:reparented",
            GraphEvent::EdgeConnected { .. } => "edge:connected",
            GraphEvent::EdgeDisconnected { .. } => "edge:disconnected",
            GraphEvent::SaveFailed { .. } => "persistence:save-failed",
        }
    }
}
