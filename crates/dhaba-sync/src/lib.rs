//! # dhaba-sync: Offline-First Reconciliation for Dhaba POS
//!
//! The terminal writes locally first; this crate makes those writes
//! eventually consistent with the remote system of record.
//!
//! ## Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  local write (dhaba-db)      row tagged pending_sync/pending_update │
//! │        │                                                            │
//! │        ▼                                                            │
//! │  Reconciler pass             fixed kind order, creation order,      │
//! │   (interval / connectivity   stop-at-first-failure per kind         │
//! │    regained / shutdown)                                             │
//! │        │                                                            │
//! │        ▼                                                            │
//! │  SyncBackend::push           at-least-once; ack marks row synced    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is at-least-once, never exactly-once: the backend must
//! treat a re-pushed envelope as idempotent.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connectivity;
pub mod error;
pub mod protocol;
pub mod reconciler;
pub mod remote;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::SyncConfig;
pub use connectivity::{connectivity_channel, ConnectivityHandle};
pub use error::{SyncError, SyncResult};
pub use protocol::{EntityKind, SyncEnvelope};
pub use reconciler::{PassSummary, Reconciler, ReconcilerHandle};
pub use remote::SyncBackend;
