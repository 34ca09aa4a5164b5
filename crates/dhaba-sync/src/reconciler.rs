//! # Reconciler
//!
//! The background loop that drains pending local rows to the backend.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  loop:                                                              │
//! │    select! {                                                        │
//! │      interval tick        ─► run_pass() if online                   │
//! │      connectivity regained─► run_pass() immediately                 │
//! │      shutdown             ─► break                                  │
//! │    }                                                                │
//! │                                                                     │
//! │  run_pass(): for each entity kind, in fixed order                   │
//! │    pull non-synced rows, oldest first                               │
//! │    push one at a time; mark synced on ack                           │
//! │    on failure: record attempt, STOP this kind, continue next kind   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stopping a kind at its first failure preserves creation order: a
//! later update is never pushed past the failed create it depends on.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{EntityKind, SyncEnvelope};
use crate::remote::SyncBackend;
use dhaba_db::{Database, PendingSyncCounts};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Rows acknowledged by the backend.
    pub pushed: usize,
    /// Entity kinds whose pass stopped at a failing row.
    pub stopped_kinds: usize,
}

/// Background reconciliation worker.
pub struct Reconciler {
    db: Database,
    backend: Arc<dyn SyncBackend>,
    config: SyncConfig,
    connectivity: watch::Receiver<bool>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a spawned [`Reconciler`].
#[derive(Clone)]
pub struct ReconcilerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ReconcilerHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::Channel("Shutdown channel closed".into()))
    }
}

impl Reconciler {
    /// Creates a reconciler and its control handle.
    pub fn new(
        db: Database,
        backend: Arc<dyn SyncBackend>,
        config: SyncConfig,
        connectivity: watch::Receiver<bool>,
    ) -> (Self, ReconcilerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let reconciler = Reconciler {
            db,
            backend,
            config,
            connectivity,
            shutdown_rx,
        };
        (reconciler, ReconcilerHandle { shutdown_tx })
    }

    /// Runs the reconciliation loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!("Reconciler starting");

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !*self.connectivity.borrow() {
                        debug!("Offline, skipping reconciliation pass");
                        continue;
                    }
                    if let Err(e) = self.run_pass().await {
                        error!(error = %e, "Reconciliation pass failed");
                    }
                }

                changed = self.connectivity.changed() => {
                    if changed.is_err() {
                        warn!("Connectivity channel closed, stopping");
                        break;
                    }
                    if *self.connectivity.borrow() {
                        info!("Connectivity regained, reconciling immediately");
                        if let Err(e) = self.run_pass().await {
                            error!(error = %e, "Reconciliation pass failed");
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Reconciler shutting down");
                    break;
                }
            }
        }

        info!("Reconciler stopped");
    }

    /// One full pass over every entity kind, in the fixed order.
    ///
    /// Only local store errors abort the pass; a backend failure stops
    /// its own kind and the pass moves on to the next kind.
    pub async fn run_pass(&self) -> SyncResult<PassSummary> {
        let mut summary = PassSummary::default();

        for kind in EntityKind::ALL {
            let stopped = match kind {
                EntityKind::Table => self.reconcile_tables(&mut summary).await?,
                EntityKind::MenuItem => self.reconcile_menu_items(&mut summary).await?,
                EntityKind::Modifier => self.reconcile_modifiers(&mut summary).await?,
                EntityKind::OrderMaster => self.reconcile_order_masters(&mut summary).await?,
                EntityKind::OrderDetail => self.reconcile_order_details(&mut summary).await?,
                EntityKind::Bill => self.reconcile_bills(&mut summary).await?,
            };
            if stopped {
                summary.stopped_kinds += 1;
            }
        }

        if summary.pushed > 0 || summary.stopped_kinds > 0 {
            info!(
                pushed = summary.pushed,
                stopped_kinds = summary.stopped_kinds,
                "Reconciliation pass finished"
            );
        }
        Ok(summary)
    }

    /// Counts of rows still awaiting acknowledgment, for the UI badge.
    pub async fn pending_counts(&self) -> SyncResult<PendingSyncCounts> {
        Ok(self.db.bills().pending_sync_counts().await?)
    }

    /// Read-through refresh of the remotely-owned catalog data.
    ///
    /// The repository upserts only overwrite rows currently `synced`, so
    /// a pending local edit is never clobbered.
    pub async fn refresh_catalog(&self) -> SyncResult<()> {
        for table in self.backend.fetch_tables().await? {
            self.db.tables().upsert_from_remote(&table).await?;
        }
        for item in self.backend.fetch_menu_items().await? {
            self.db.menu().upsert_item_from_remote(&item).await?;
        }
        for modifier in self.backend.fetch_modifiers().await? {
            self.db.menu().upsert_modifier_from_remote(&modifier).await?;
        }
        debug!("Catalog refreshed from backend");
        Ok(())
    }

    // =========================================================================
    // Per-kind passes
    // =========================================================================
    // Each returns whether the kind stopped at a failing row.

    async fn reconcile_tables(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.tables().list_pending_sync(self.config.batch_size).await?;
        for row in rows {
            let envelope =
                SyncEnvelope::wrap(EntityKind::Table, &row.id, &row, row.sync.last_modified)?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.tables().mark_synced(&row.id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .tables()
                        .record_sync_failure(&row.id, &e.to_string(), self.config.max_attempts)
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn reconcile_menu_items(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.menu().list_pending_items(self.config.batch_size).await?;
        for row in rows {
            let envelope =
                SyncEnvelope::wrap(EntityKind::MenuItem, &row.id, &row, row.sync.last_modified)?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.menu().mark_item_synced(&row.id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .menu()
                        .record_item_sync_failure(&row.id, &e.to_string(), self.config.max_attempts)
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn reconcile_modifiers(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.menu().list_pending_modifiers(self.config.batch_size).await?;
        for row in rows {
            let envelope =
                SyncEnvelope::wrap(EntityKind::Modifier, &row.id, &row, row.sync.last_modified)?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.menu().mark_modifier_synced(&row.id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .menu()
                        .record_modifier_sync_failure(
                            &row.id,
                            &e.to_string(),
                            self.config.max_attempts,
                        )
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn reconcile_order_masters(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.orders().list_pending_masters(self.config.batch_size).await?;
        for row in rows {
            let envelope = SyncEnvelope::wrap(
                EntityKind::OrderMaster,
                row.order_master_id.to_string(),
                &row,
                row.sync.last_modified,
            )?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.orders().mark_master_synced(row.order_master_id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .orders()
                        .record_master_sync_failure(
                            row.order_master_id,
                            &e.to_string(),
                            self.config.max_attempts,
                        )
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn reconcile_order_details(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.orders().list_pending_details(self.config.batch_size).await?;
        for row in rows {
            let envelope =
                SyncEnvelope::wrap(EntityKind::OrderDetail, &row.id, &row, row.sync.last_modified)?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.orders().mark_detail_synced(&row.id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .orders()
                        .record_detail_sync_failure(
                            &row.id,
                            &e.to_string(),
                            self.config.max_attempts,
                        )
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn reconcile_bills(&self, summary: &mut PassSummary) -> SyncResult<bool> {
        let rows = self.db.bills().list_pending_sync(self.config.batch_size).await?;
        for row in rows {
            let envelope =
                SyncEnvelope::wrap(EntityKind::Bill, &row.id, &row, row.sync.last_modified)?;
            match self.backend.push(&envelope).await {
                Ok(()) => {
                    self.db.bills().mark_synced(&row.id).await?;
                    summary.pushed += 1;
                }
                Err(e) => {
                    self.db
                        .bills()
                        .record_sync_failure(&row.id, &e.to_string(), self.config.max_attempts)
                        .await?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
