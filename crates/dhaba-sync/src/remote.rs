//! Backend contract consumed by the reconciler.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::protocol::SyncEnvelope;
use dhaba_core::{DiningTable, MenuItem, Modifier};

/// The remote system of record, as the sync layer sees it.
///
/// `push` must be idempotent on the remote side: at-least-once delivery
/// means an envelope may arrive again after a lost acknowledgment.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Pushes one pending row. An `Err` stops the current pass for that
    /// entity kind.
    async fn push(&self, envelope: &SyncEnvelope) -> SyncResult<()>;

    /// Remote snapshot of the table directory, for read-through refresh.
    async fn fetch_tables(&self) -> SyncResult<Vec<DiningTable>>;

    /// Remote snapshot of the menu catalog.
    async fn fetch_menu_items(&self) -> SyncResult<Vec<MenuItem>>;

    /// Remote snapshot of the modifier catalog.
    async fn fetch_modifiers(&self) -> SyncResult<Vec<Modifier>>;
}
