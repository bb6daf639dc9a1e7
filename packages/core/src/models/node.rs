//! Node Data Structures
//!
//! This module defines the `Node` struct, the level color taxonomy, and the
//! partial-update payload used by the mutation layer.
//!
//! # Architecture
//!
//! - **Flat node records**: Every node carries its own `parent_id` back-reference
//!   and an ordered `children` id list. The two are kept mutually derivable by
//!   [`GraphService`](crate::services::GraphService) — never edit them directly.
//! - **Opaque payload**: Entity-specific content the core never interprets
//!   (tags, icons, html blocks, media) rides in the flattened `extra` map.
//!
//! # Examples
//!
//! ```rust
//! use cardflow_core::models::Node;
//!
//! let node = Node::new(1, "Getting started".to_string(), 0.0);
//! assert!(node.parent_id.is_none());
//! assert!(node.children.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Neutral color used for levels outside the 1-4 taxonomy.
pub const FALLBACK_COLOR: &str = "#6b7280";

/// Static level taxonomy: (level, display color, short label).
pub const LEVEL_COLORS: [(u8, &str, &str); 4] = [
    (1, "#3b82f6", "N1"),
    (2, "#10b981", "N2"),
    (3, "#f59e0b", "N3"),
    (4, "#ef4444", "N4"),
];

/// Display color for a taxonomy level, with a neutral fallback for unknown levels.
pub fn level_color(level: u8) -> &'static str {
    LEVEL_COLORS
        .iter()
        .find(|(l, _, _)| *l == level)
        .map(|(_, color, _)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// Short display label for a taxonomy level (`"N1"` through `"N4"`, `"N?"` otherwise).
pub fn level_label(level: u8) -> &'static str {
    LEVEL_COLORS
        .iter()
        .find(|(l, _, _)| *l == level)
        .map(|(_, _, label)| *label)
        .unwrap_or("N?")
}

/// Validation errors for Node operations
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Publication status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Secondary title line shown under the main card title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Channel/schedule visibility settings, passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub is_enabled_on_non_business_day: bool,
    pub enabled_on_channels: Vec<String>,
}

/// A single content card in the hierarchy.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4), immutable after creation
/// - `level`: Taxonomy depth 1-4, drives the display color via [`level_color`]
/// - `order`: Sibling sort key, ascending, ties broken by insertion order
/// - `parent_id`: Back-reference to the single parent (None means root)
/// - `children`: Ordered child id list, always in lockstep with `parent_id`
/// - `extra`: Opaque attachment the core passes through unexamined
///
/// Relational fields (`parent_id`, `children`) change only through
/// `GraphService::set_parent` / `add_child` / `remove_child`; the generic
/// update path cannot touch them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Taxonomy depth (1-4)
    pub level: u8,

    /// Sibling sort key (meaningful only among nodes sharing a parent)
    pub order: f64,

    /// Card title (required, non-empty)
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Optional link target
    pub url: Option<String>,

    /// Optional body content
    pub content: Option<String>,

    /// Optional secondary title
    pub subtitle: Option<Subtitle>,

    /// Publication status
    pub status: CardStatus,

    /// Channel/schedule visibility, uninterpreted
    pub display_config: Option<DisplayConfig>,

    /// Parent back-reference (None means this node is a root)
    pub parent_id: Option<String>,

    /// Ordered child id list
    pub children: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,

    /// Opaque entity-specific fields (tags, icon, html content, media, ...)
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Create a new root node with an auto-generated UUID.
    ///
    /// Optional content fields start empty; the caller fills them before
    /// insertion (see `GraphService::create_node`).
    pub fn new(level: u8, title: String, order: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            order,
            title,
            description: None,
            url: None,
            content: None,
            subtitle: None,
            status: CardStatus::default(),
            display_config: None,
            parent_id: None,
            children: Vec::new(),
            created_at: now,
            modified_at: now,
            extra: serde_json::Map::new(),
        }
    }

    /// Merge a partial update into this node's non-relational fields.
    ///
    /// `extra` entries are merged key by key so an update does not wipe
    /// unrelated opaque fields. Timestamp bumping is the caller's job.
    pub fn apply(&mut self, patch: NodePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
        if let Some(content) = patch.content {
            self.content = Some(content);
        }
        if let Some(subtitle) = patch.subtitle {
            self.subtitle = Some(subtitle);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(display_config) = patch.display_config {
            self.display_config = Some(display_config);
        }
        if let Some(extra) = patch.extra {
            for (key, value) in extra {
                self.extra.insert(key, value);
            }
        }
    }
}

/// Partial update for a node's non-relational fields.
///
/// Deliberately has no `parent_id`/`children` members: relational keys present
/// in a JSON payload deserialize into nothing and are silently dropped.
/// Reparenting goes through `GraphService::set_parent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub subtitle: Option<Subtitle>,
    pub status: Option<CardStatus>,
    pub level: Option<u8>,
    pub order: Option<f64>,
    pub display_config: Option<DisplayConfig>,
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
}
