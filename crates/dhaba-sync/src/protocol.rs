//! # Push Envelopes
//!
//! The wire-agnostic shape a pending row is pushed in: an entity kind,
//! the entity's id and its full JSON snapshot. The backend maps these
//! onto whatever transport it speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

/// The synchronized entity kinds, in reconciliation order.
///
/// The order matters: orders before their details, details before the
/// bill that aggregates them, so the remote never sees a child without
/// its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Table,
    MenuItem,
    Modifier,
    OrderMaster,
    OrderDetail,
    Bill,
}

impl EntityKind {
    /// All kinds in the fixed per-pass order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Table,
        EntityKind::MenuItem,
        EntityKind::Modifier,
        EntityKind::OrderMaster,
        EntityKind::OrderDetail,
        EntityKind::Bill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::MenuItem => "menu_item",
            EntityKind::Modifier => "modifier",
            EntityKind::OrderMaster => "order_master",
            EntityKind::OrderDetail => "order_detail",
            EntityKind::Bill => "bill",
        }
    }
}

/// One pending row, serialized for push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub kind: EntityKind,
    pub entity_id: String,
    /// Full JSON snapshot of the row, sync metadata included.
    pub payload: serde_json::Value,
    pub last_modified: DateTime<Utc>,
}

impl SyncEnvelope {
    /// Wraps a serializable row into an envelope.
    pub fn wrap<T: Serialize>(
        kind: EntityKind,
        entity_id: impl Into<String>,
        row: &T,
        last_modified: DateTime<Utc>,
    ) -> SyncResult<Self> {
        Ok(SyncEnvelope {
            kind,
            entity_id: entity_id.into(),
            payload: serde_json::to_value(row)?,
            last_modified,
        })
    }
}
