//! # dhaba-db: Database Layer for Dhaba POS
//!
//! SQLite persistence for the order-and-billing engine, using sqlx for
//! async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  dhaba-engine operation (place order / create bill)                 │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  dhaba-db (THIS CRATE)                                              │
//! │                                                                     │
//! │   ┌────────────┐   ┌────────────────┐   ┌──────────────┐            │
//! │   │  Database  │   │  Repositories  │   │  Migrations  │            │
//! │   │ (pool.rs)  │◄──│ table/menu/    │   │  (embedded)  │            │
//! │   │ SqlitePool │   │ order/bill     │   │ 001_init.sql │            │
//! │   └────────────┘   └────────────────┘   └──────────────┘            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite file (WAL) — the single source of truth for UI reads        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sync columns
//! Every synchronized table carries `sync_status`, `sync_attempts`,
//! `sync_error` and `last_modified`. Repositories tag rows `pending_*`
//! on local mutation; dhaba-sync later advances them to `synced` or
//! `sync_failed`.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::bill::{BillRepository, PendingSyncCounts};
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;
pub use repository::table::TableRepository;
