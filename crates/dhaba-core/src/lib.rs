//! # dhaba-core: Pure Business Logic for Dhaba POS
//!
//! This crate is the **heart** of the order-and-billing engine. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Dhaba POS Architecture                         │
//! │                                                                     │
//! │  UI intent (place items / checkout)                                 │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  dhaba-engine (Order State Coordinator, Billing Aggregator)         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ★ dhaba-core (THIS CRATE) ★                                        │
//! │                                                                     │
//! │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ ┌────────────┐    │
//! │   │  types  │ │  money  │ │   tax    │ │  kot  │ │ validation │    │
//! │   │ Order…  │ │Precision│ │ GST/cess │ │ batch │ │   rules    │    │
//! │   └─────────┘ └─────────┘ └──────────┘ └───────┘ └────────────┘    │
//! │                                                                     │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  dhaba-db (SQLite repositories) / dhaba-sync (reconciliation)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (OrderMaster, OrderDetail, MenuItem, Bill, ...)
//! - [`money`] - Rounding policy: tenant-configured precision, half-up
//! - [`tax`] - GST / cess decomposition (inclusive and exclusive)
//! - [`pricing`] - Channel routing and per-line tax computation
//! - [`kot`] - Kitchen ticket batching by kitchen category
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: all monetary values are `rust_decimal::Decimal`
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kot;
pub mod money;
pub mod pricing;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use kot::{build_kot_batches, KotItem, KotRequest};
pub use money::Precision;
pub use pricing::{price_line, PricedLine};
pub use tax::{decompose_gst, decompose_gst_and_cess, GstBreakup, GstCessBreakup};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items allowed in a single placement batch.
pub const MAX_ORDER_LINES: usize = 100;
