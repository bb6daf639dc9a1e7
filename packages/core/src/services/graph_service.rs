//! Graph Service - Invariant-Preserving Mutations
//!
//! The mutation engine for the content graph. Every write goes through here so
//! the structural invariants hold after each operation:
//!
//! - `child in parent.children  <=>  child.parent_id == parent.id`
//! - node ids are unique across the store
//! - one edge per parent/child relation, plus explicit connections
//! - no node is its own ancestor (checked at reparent time)
//!
//! # Errors
//!
//! Structural errors are returned synchronously and leave no partial state:
//! validation happens before the first field is touched. Persistence failures
//! arrive later on the event channel and never roll anything back.
//!
//! # Concurrency
//!
//! Mutations are plain `&mut self` calls — single active editor, no locking,
//! nothing suspends mid-mutation. The only asynchronous boundary is the save
//! request dispatched to the background saver task after a mutation commits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use crate::events::{GraphEvent, EVENT_CHANNEL_CAPACITY};
use crate::layout::{self, Point};
use crate::models::{
    CardStatus, DisplayConfig, EdgeKind, Node, NodePatch, Subtitle, ValidationError,
};
use crate::persistence::gateway::{spawn_saver, SnapshotGateway};
use crate::persistence::snapshot::{self, SnapshotRecord};
use crate::services::edge_sync::EdgeSynchronizer;
use crate::services::error::GraphError;
use crate::store::GraphStore;

/// Parameters for creating a node.
///
/// Only `title` is required (and must be non-empty); everything else has a
/// sensible default, so call sites spell out just what they need:
///
/// ```rust
/// use cardflow_core::services::{CreateNodeParams, GraphService};
///
/// let mut service = GraphService::new();
/// let id = service
///     .create_node(CreateNodeParams {
///         level: 1,
///         title: "Payments".to_string(),
///         ..Default::default()
///     })
///     .unwrap();
/// assert!(service.store().contains(&id));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CreateNodeParams {
    /// Taxonomy depth (1-4)
    pub level: u8,
    /// Card title (required, non-empty)
    pub title: String,
    /// Sibling sort key
    pub order: f64,
    pub description: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub subtitle: Option<Subtitle>,
    pub status: Option<CardStatus>,
    pub display_config: Option<DisplayConfig>,
    /// Opaque fields passed through to the node
    pub extra: serde_json::Map<String, Value>,
}

/// Core service for graph mutations, edge synchronization, and persistence
/// dispatch.
///
/// One instance is owned per editing session: hydrate once from a snapshot,
/// mutate, let saves trickle out, discard with the session.
pub struct GraphService {
    store: GraphStore,
    edges: EdgeSynchronizer,

    /// Broadcast channel for domain events
    event_tx: broadcast::Sender<GraphEvent>,

    /// Save-request channel to the background saver task, when a gateway is
    /// attached. Mutations commit in memory first; saving is best-effort.
    save_tx: Option<mpsc::UnboundedSender<Vec<SnapshotRecord>>>,
}

impl Default for GraphService {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphService {
    /// Create a service without a persistence gateway (saves are skipped).
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store: GraphStore::new(),
            edges: EdgeSynchronizer::new(),
            event_tx,
            save_tx: None,
        }
    }

    /// Create a service that dispatches a full-snapshot save to `gateway`
    /// after every structure-changing mutation.
    ///
    /// Must be called from within a tokio runtime: the saver task is spawned
    /// here. Pending saves are superseded by later ones (last-write-wins);
    /// failures surface as [`GraphEvent::SaveFailed`], never as a rollback.
    pub fn with_gateway(gateway: Arc<dyn SnapshotGateway>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (save_tx, save_rx) = mpsc::unbounded_channel();
        spawn_saver(gateway, save_rx, event_tx.clone());
        Self {
            store: GraphStore::new(),
            edges: EdgeSynchronizer::new(),
            event_tx,
            save_tx: Some(save_tx),
        }
    }

    /// Read access to the node store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Read access to the derived edge set.
    pub fn edges(&self) -> &EdgeSynchronizer {
        &self.edges
    }

    /// Subscribe to domain events.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.event_tx.subscribe()
    }

    /// Create a new root node and return its id.
    ///
    /// Fails with a validation error when the title is empty or whitespace;
    /// nothing is mutated in that case.
    pub fn create_node(&mut self, params: CreateNodeParams) -> Result<String, GraphError> {
        if params.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()).into());
        }

        let mut node = Node::new(params.level, params.title, params.order);
        node.description = params.description;
        node.url = params.url;
        node.content = params.content;
        node.subtitle = params.subtitle;
        if let Some(status) = params.status {
            node.status = status;
        }
        node.display_config = params.display_config;
        node.extra = params.extra;

        let id = node.id.clone();
        self.store.insert(node);
        tracing::debug!(id = %id, "node created");
        self.emit(GraphEvent::NodeCreated { id: id.clone() });
        self.request_save();
        Ok(id)
    }

    /// Merge a partial update into a node's non-relational fields.
    ///
    /// Relational keys in the payload never reach the node (see
    /// [`NodePatch`]); reparenting goes through [`Self::set_parent`]. A level
    /// change recolors the relation edge pointing at the node.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        let node = self
            .store
            .get_mut(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        let level_before = node.level;
        node.apply(patch);
        node.modified_at = Utc::now();
        let level_changed = node.level != level_before;
        let parent_id = node.parent_id.clone();

        if level_changed {
            // The edge color derives from the target's level; resync it.
            if let Some(parent_id) = parent_id {
                if let (Some(parent), Some(child)) =
                    (self.store.get(&parent_id), self.store.get(id))
                {
                    self.edges.insert_relation(parent, child);
                    self.edges.reslot(parent);
                }
            }
        }

        self.emit(GraphEvent::NodeUpdated { id: id.to_string() });
        self.request_save();
        Ok(())
    }

    /// Delete a node.
    ///
    /// Removes the record, removes it from its former parent's children, and
    /// removes every edge where it is source or target. The node's children
    /// are promoted to the grandparent — or become roots when there is none —
    /// so no `parent_id` is ever left dangling.
    pub fn delete_node(&mut self, id: &str) -> Result<(), GraphError> {
        let node = self
            .store
            .remove(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        let now = Utc::now();
        let grandparent = node.parent_id.clone();

        if let Some(parent_id) = &grandparent {
            if let Some(parent) = self.store.get_mut(parent_id) {
                parent.children.retain(|child| child != id);
                parent.modified_at = now;
            }
        }
        self.edges.remove_touching(id);

        for child_id in &node.children {
            match self.store.get_mut(child_id) {
                Some(child) => {
                    child.parent_id = grandparent.clone();
                    child.modified_at = now;
                }
                None => continue,
            }
            if let Some(parent_id) = &grandparent {
                if let Some(parent) = self.store.get_mut(parent_id) {
                    parent.children.push(child_id.clone());
                }
                if let (Some(parent), Some(child)) =
                    (self.store.get(parent_id), self.store.get(child_id))
                {
                    self.edges.insert_relation(parent, child);
                }
            }
        }
        if let Some(parent_id) = &grandparent {
            if let Some(parent) = self.store.get(parent_id) {
                self.edges.reslot(parent);
            }
        }

        tracing::debug!(id = %id, promoted = node.children.len(), "node deleted");
        self.emit(GraphEvent::NodeDeleted { id: id.to_string() });
        self.request_save();
        Ok(())
    }

    /// Move a node under a new parent, or detach it (`None` makes it a root).
    ///
    /// Validates everything before mutating anything: unknown ids fail with
    /// `NodeNotFound`, and a parent that is the child itself or one of its
    /// descendants fails with `Cycle`, leaving the tree exactly as it was.
    /// Setting the parent a node already has succeeds as a no-op.
    pub fn set_parent(
        &mut self,
        child_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), GraphError> {
        let current_parent = match self.store.get(child_id) {
            Some(node) => node.parent_id.clone(),
            None => return Err(GraphError::node_not_found(child_id)),
        };
        if let Some(parent_id) = new_parent_id {
            if !self.store.contains(parent_id) {
                return Err(GraphError::node_not_found(parent_id));
            }
            if self.would_cycle(child_id, parent_id) {
                return Err(GraphError::cycle(child_id, parent_id));
            }
        }
        if current_parent.as_deref() == new_parent_id {
            return Ok(());
        }

        let now = Utc::now();

        // Detach from the previous parent, edge included.
        if let Some(old_parent_id) = &current_parent {
            if let Some(old_parent) = self.store.get_mut(old_parent_id) {
                old_parent.children.retain(|id| id != child_id);
                old_parent.modified_at = now;
            }
            self.edges.remove_between(old_parent_id, child_id);
            if let Some(old_parent) = self.store.get(old_parent_id) {
                self.edges.reslot(old_parent);
            }
        }

        match new_parent_id {
            Some(parent_id) => {
                if let Some(child) = self.store.get_mut(child_id) {
                    child.parent_id = Some(parent_id.to_string());
                    child.modified_at = now;
                }
                if let Some(parent) = self.store.get_mut(parent_id) {
                    parent.children.push(child_id.to_string());
                    parent.modified_at = now;
                }
                if let (Some(parent), Some(child)) =
                    (self.store.get(parent_id), self.store.get(child_id))
                {
                    self.edges.insert_relation(parent, child);
                    self.edges.reslot(parent);
                }
            }
            None => {
                if let Some(child) = self.store.get_mut(child_id) {
                    child.parent_id = None;
                    child.modified_at = now;
                }
            }
        }

        self.emit(GraphEvent::ParentChanged {
            child_id: child_id.to_string(),
            parent_id: new_parent_id.map(str::to_string),
        });
        self.request_save();
        Ok(())
    }

    /// Attach `child_id` under `parent_id`; relation and edge commit together.
    pub fn add_child(&mut self, parent_id: &str, child_id: &str) -> Result<(), GraphError> {
        if !self.store.contains(parent_id) {
            return Err(GraphError::node_not_found(parent_id));
        }
        self.set_parent(child_id, Some(parent_id))
    }

    /// Detach `child_id` from `parent_id`; relation and edge commit together.
    ///
    /// Fails with `EdgeNotFound` when that relation does not currently exist.
    pub fn remove_child(&mut self, parent_id: &str, child_id: &str) -> Result<(), GraphError> {
        if !self.store.contains(parent_id) {
            return Err(GraphError::node_not_found(parent_id));
        }
        let child = self
            .store
            .get(child_id)
            .ok_or_else(|| GraphError::node_not_found(child_id))?;
        if child.parent_id.as_deref() != Some(parent_id) {
            return Err(GraphError::edge_not_found(parent_id, child_id));
        }
        self.set_parent(child_id, None)
    }

    /// Draw an explicit connection edge between two nodes.
    ///
    /// Tolerated as an extra non-tree edge: it is NOT reflected into
    /// `parent_id`/`children`. Use [`Self::connect_as_child`] for the
    /// "connect as child" gesture.
    pub fn connect(
        &mut self,
        source_id: &str,
        target_id: &str,
        source_slot: Option<usize>,
        target_slot: Option<usize>,
    ) -> Result<String, GraphError> {
        let source = self
            .store
            .get(source_id)
            .ok_or_else(|| GraphError::node_not_found(source_id))?;
        let target = self
            .store
            .get(target_id)
            .ok_or_else(|| GraphError::node_not_found(target_id))?;
        let edge_id = self
            .edges
            .insert_connection(source, target, source_slot, target_slot);
        self.emit(GraphEvent::EdgeConnected {
            source: source_id.to_string(),
            target: target_id.to_string(),
        });
        Ok(edge_id)
    }

    /// Connect gesture that also establishes the parent/child relation.
    pub fn connect_as_child(&mut self, source_id: &str, target_id: &str) -> Result<(), GraphError> {
        self.add_child(source_id, target_id)
    }

    /// Remove the edge between two nodes.
    ///
    /// When the edge mirrors a parent/child relation this routes through
    /// [`Self::remove_child`] so the relational pointers cannot drift from the
    /// visual edge set. A free connection edge is simply dropped.
    pub fn disconnect(&mut self, source_id: &str, target_id: &str) -> Result<(), GraphError> {
        let kind = self
            .edges
            .edge_between(source_id, target_id)
            .map(|edge| edge.kind)
            .ok_or_else(|| GraphError::edge_not_found(source_id, target_id))?;

        match kind {
            EdgeKind::Relation => self.remove_child(source_id, target_id),
            EdgeKind::Connection => {
                self.edges.remove_between(source_id, target_id);
                self.emit(GraphEvent::EdgeDisconnected {
                    source: source_id.to_string(),
                    target: target_id.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Hydrate the store from a snapshot, replacing current contents.
    ///
    /// Accepts both external shapes (nested cards, flat parent links),
    /// normalizes them into the canonical flat representation, and rebuilds
    /// the full edge set once. Duplicate ids keep the first record.
    pub fn hydrate(&mut self, records: Vec<SnapshotRecord>) -> Result<(), GraphError> {
        self.store.clear();
        self.edges.clear();

        for node in snapshot::flatten_records(records) {
            if self.store.contains(&node.id) {
                tracing::warn!(id = %node.id, "duplicate node id in snapshot, keeping first record");
                continue;
            }
            self.store.insert(node);
        }
        self.normalize_relations();
        self.edges.rebuild(&self.store);

        tracing::debug!(
            nodes = self.store.len(),
            edges = self.edges.len(),
            "graph hydrated"
        );
        Ok(())
    }

    /// Hydrate from whatever the gateway last stored.
    pub async fn hydrate_from(&mut self, gateway: &dyn SnapshotGateway) -> Result<(), GraphError> {
        let records = gateway.load().await?;
        self.hydrate(records)
    }

    /// Serialize the full graph for the persistence gateway.
    pub fn snapshot(&self) -> Vec<SnapshotRecord> {
        self.store.list().map(SnapshotRecord::from_node).collect()
    }

    /// Compute coordinates for every node from the current structure.
    pub fn layout(&self) -> HashMap<String, Point> {
        layout::compute(&self.store)
    }

    /// Would making `new_parent_id` the parent of `child_id` create a cycle?
    ///
    /// Explicit ancestor-chain walk from the candidate parent; the visited
    /// set guards against walking a cycle that somehow already exists.
    fn would_cycle(&self, child_id: &str, new_parent_id: &str) -> bool {
        if child_id == new_parent_id {
            return true;
        }
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = Some(new_parent_id.to_string());
        while let Some(id) = current {
            if id == child_id {
                return true;
            }
            if !seen.insert(id.clone()) {
                return false;
            }
            current = self.store.get(&id).and_then(|node| node.parent_id.clone());
        }
        false
    }

    /// Enforce the children/parent bijection after hydration.
    ///
    /// External data may list a child under a parent without the back-
    /// reference, declare a parent that never listed the child, reference
    /// unknown ids, or even encode a cycle. Ownership is resolved
    /// deterministically — the first parent (in record order) listing a child
    /// wins, declared parents fill the gaps, cycles are broken by detaching —
    /// and both relational fields are rewritten from the result.
    fn normalize_relations(&mut self) {
        let ids: Vec<String> = self.store.list().map(|node| node.id.clone()).collect();

        let mut owner: HashMap<String, String> = HashMap::new();
        for parent_id in &ids {
            let listed = self
                .store
                .get(parent_id)
                .map(|node| node.children.clone())
                .unwrap_or_default();
            for child_id in listed {
                if child_id != *parent_id && self.store.contains(&child_id) {
                    owner.entry(child_id).or_insert_with(|| parent_id.clone());
                }
            }
        }
        for child_id in &ids {
            let declared = self
                .store
                .get(child_id)
                .and_then(|node| node.parent_id.clone());
            if let Some(parent_id) = declared {
                if parent_id != *child_id && self.store.contains(&parent_id) {
                    owner.entry(child_id.clone()).or_insert(parent_id);
                }
            }
        }

        // Break cycles: a node whose ancestor chain walks back to itself is
        // detached to a root.
        for id in &ids {
            let mut seen: HashSet<String> = HashSet::new();
            let mut current = owner.get(id).cloned();
            while let Some(parent_id) = current {
                if parent_id == *id {
                    tracing::warn!(id = %id, "cycle in snapshot relations, detaching node");
                    owner.remove(id);
                    break;
                }
                if !seen.insert(parent_id.clone()) {
                    break;
                }
                current = owner.get(&parent_id).cloned();
            }
        }

        let mut canonical: HashMap<String, Vec<String>> = HashMap::new();
        for parent_id in &ids {
            let listed = self
                .store
                .get(parent_id)
                .map(|node| node.children.clone())
                .unwrap_or_default();
            let entry = canonical.entry(parent_id.clone()).or_default();
            for child_id in listed {
                if owner.get(&child_id).map(String::as_str) == Some(parent_id.as_str())
                    && !entry.contains(&child_id)
                {
                    entry.push(child_id);
                }
            }
        }
        // Flat-shape children never listed anywhere are appended in record order.
        for child_id in &ids {
            if let Some(parent_id) = owner.get(child_id) {
                let entry = canonical.entry(parent_id.clone()).or_default();
                if !entry.contains(child_id) {
                    entry.push(child_id.clone());
                }
            }
        }

        for id in &ids {
            let parent_id = owner.get(id).cloned();
            let children = canonical.remove(id).unwrap_or_default();
            if let Some(node) = self.store.get_mut(id) {
                node.parent_id = parent_id;
                node.children = children;
            }
        }
    }

    fn emit(&self, event: GraphEvent) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.event_tx.send(event);
    }

    fn request_save(&self) {
        if let Some(save_tx) = &self.save_tx {
            if save_tx.send(self.snapshot()).is_err() {
                tracing::warn!("snapshot saver task is gone; save request dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(service: &mut GraphService, level: u8, title: &str, order: f64) -> String {
        service
            .create_node(CreateNodeParams {
                level,
                title: title.to_string(),
                order,
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut service = GraphService::new();
        let err = service
            .create_node(CreateNodeParams {
                level: 1,
                title: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GraphError::ValidationFailed(_)));
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_set_parent_same_parent_is_noop() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);
        let c = create(&mut service, 2, "C", 1.0);
        service.set_parent(&b, Some(&a)).unwrap();
        service.set_parent(&c, Some(&a)).unwrap();

        // Re-setting the same parent must not shuffle sibling order.
        service.set_parent(&b, Some(&a)).unwrap();
        assert_eq!(service.store().get(&a).unwrap().children, vec![b, c]);
    }

    #[test]
    fn test_detach_rootless_node_is_noop_success() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        assert!(service.set_parent(&a, None).is_ok());
        assert!(service.store().get(&a).unwrap().parent_id.is_none());
    }

    #[test]
    fn test_would_cycle_detects_self_and_descendants() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);
        let c = create(&mut service, 3, "C", 0.0);
        service.set_parent(&b, Some(&a)).unwrap();
        service.set_parent(&c, Some(&b)).unwrap();

        assert!(service.would_cycle(&a, &a));
        assert!(service.would_cycle(&a, &b));
        assert!(service.would_cycle(&a, &c));
        assert!(!service.would_cycle(&c, &a));
    }

    #[test]
    fn test_update_level_recolors_relation_edge() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);
        service.add_child(&a, &b).unwrap();
        assert_eq!(service.edges().edge_between(&a, &b).unwrap().color, "#10b981");

        service
            .update_node(
                &b,
                NodePatch {
                    level: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(service.edges().edge_between(&a, &b).unwrap().color, "#ef4444");
    }

    #[test]
    fn test_connect_does_not_touch_relations() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);

        service.connect(&a, &b, Some(0), Some(1)).unwrap();
        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert!(service.store().get(&a).unwrap().children.is_empty());
        assert_eq!(service.edges().len(), 1);
    }

    #[test]
    fn test_disconnect_relation_routes_through_remove_child() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);
        service.add_child(&a, &b).unwrap();

        service.disconnect(&a, &b).unwrap();
        assert!(service.store().get(&b).unwrap().parent_id.is_none());
        assert!(service.store().get(&a).unwrap().children.is_empty());
        assert!(service.edges().is_empty());
    }

    #[test]
    fn test_disconnect_missing_edge_fails() {
        let mut service = GraphService::new();
        let a = create(&mut service, 1, "A", 0.0);
        let b = create(&mut service, 2, "B", 0.0);
        assert!(matches!(
            service.disconnect(&a, &b),
            Err(GraphError::EdgeNotFound { .. })
        ));
    }
}
