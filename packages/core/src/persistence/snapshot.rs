//! Snapshot Serialization
//!
//! The wire shape exchanged with the persistence gateway: an ordered sequence
//! of `{ id, type: "card", data: {...} }` records.
//!
//! # Load-boundary translation
//!
//! Source data historically carried the tree in two incompatible shapes
//! interchangeably: fully nested card objects embedded inside `children` (or
//! the legacy `childrens` key), and flat records linked only by a `parent` id.
//! Both are accepted here and flattened into the canonical representation —
//! a flat node-by-id map plus ordered child-id lists. Nested copies are never
//! stored. Saves always emit the flat shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CardStatus, DisplayConfig, Node, Subtitle};

/// Record type tag carried by every snapshot entry.
pub const RECORD_TYPE: &str = "card";

/// Top-level snapshot file shape: `{ "cards": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub cards: Vec<SnapshotRecord>,
}

/// One serialized node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,
    pub data: CardData,
}

fn default_record_type() -> String {
    RECORD_TYPE.to_string()
}

/// A child entry on the wire: either a plain id or a fully nested card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Id(String),
    Nested(NestedCard),
}

/// A nested card object (the embedded external shape). May lack an id, in
/// which case a fresh one is assigned during flattening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub data: CardData,
}

/// Serialized card payload. Identity/relational metadata is explicit; every
/// other field rides the flattened `extra` map untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub title: String,
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub order: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Subtitle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_config: Option<DisplayConfig>,
    /// Serialized `parent_id` back-reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Child entries: ids on save; ids or nested cards on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildRef>,
    /// Legacy nested-children key, accepted on load only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub childrens: Vec<NestedCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SnapshotRecord {
    /// Serialize a node into its wire record (flat shape).
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            record_type: RECORD_TYPE.to_string(),
            data: CardData {
                title: node.title.clone(),
                level: node.level,
                order: node.order,
                description: node.description.clone(),
                url: node.url.clone(),
                content: node.content.clone(),
                subtitle: node.subtitle.clone(),
                status: Some(node.status),
                display_config: node.display_config.clone(),
                parent: node.parent_id.clone(),
                children: node.children.iter().cloned().map(ChildRef::Id).collect(),
                childrens: Vec::new(),
                created_at: Some(node.created_at),
                modified_at: Some(node.modified_at),
                extra: node.extra.clone(),
            },
        }
    }
}

/// Flatten a snapshot into node records, resolving both external shapes.
///
/// Nested cards are hoisted into their own records with `parent_id` pointing
/// at the enclosing card (overriding any stray `parent` field they carry) and
/// replaced by their id in the enclosing `children` list, preserving order.
/// Relational reconciliation beyond that (pruning unknown ids, enforcing the
/// children/parent bijection) happens during hydration.
pub fn flatten_records(records: Vec<SnapshotRecord>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for record in records {
        flatten_card(Some(record.id), record.data, None, &mut nodes);
    }
    nodes
}

fn flatten_card(
    id: Option<String>,
    data: CardData,
    enclosing: Option<&str>,
    out: &mut Vec<Node>,
) -> String {
    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut child_ids = Vec::new();
    let mut descendants = Vec::new();
    for child in data.children {
        match child {
            ChildRef::Id(child_id) => child_ids.push(child_id),
            ChildRef::Nested(card) => {
                child_ids.push(flatten_card(card.id, card.data, Some(&id), &mut descendants));
            }
        }
    }
    for card in data.childrens {
        child_ids.push(flatten_card(card.id, card.data, Some(&id), &mut descendants));
    }

    // Nested placement wins over whatever parent field the card carried.
    let parent_id = match enclosing {
        Some(enclosing) => Some(enclosing.to_string()),
        None => data.parent,
    };

    let now = Utc::now();
    out.push(Node {
        id: id.clone(),
        level: data.level,
        order: data.order,
        title: data.title,
        description: data.description,
        url: data.url,
        content: data.content,
        subtitle: data.subtitle,
        status: data.status.unwrap_or_default(),
        display_config: data.display_config,
        parent_id,
        children: child_ids,
        created_at: data.created_at.unwrap_or(now),
        modified_at: data.modified_at.unwrap_or(now),
        extra: data.extra,
    });
    out.append(&mut descendants);

    id
}
