//! # dhaba-engine: Order & Billing Orchestration for Dhaba POS
//!
//! The operational heart of the terminal: order placement, kitchen
//! ticket dispatch and checkout, composed from the pure logic in
//! `dhaba-core` and the local store in `dhaba-db`.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  intent ─► OrderService::place_or_update_order                      │
//! │               │  price lines (dhaba-core), commit locally,          │
//! │               │  push best-effort, dispatch KOT tickets             │
//! │               ▼                                                     │
//! │          BillingService::create_bill                                │
//! │               │  aggregate open lines, allocate bill number,        │
//! │               │  finalize atomically, assemble receipt              │
//! │               ▼                                                     │
//! │          dhaba-sync reconciles whatever the pushes left pending     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Remote collaborators (id allocators, tax master, uplink, printers)
//! are consumed through the async traits in [`remote`], keeping the
//! engine transport-agnostic.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod context;
pub mod error;
pub mod kot;
pub mod orders;
pub mod remote;

// =============================================================================
// Re-exports
// =============================================================================

pub use billing::{BillOutcome, BillReceipt, BillingService, ReceiptLine};
pub use context::SessionContext;
pub use error::{EngineError, EngineResult};
pub use kot::{KotDispatchReport, KotDispatcher, PrintDispatchError};
pub use orders::{OrderLineRequest, OrderService, PlacedOrder};
pub use remote::{IdAllocator, OrderUplink, RemoteError, RemoteResult, TaxMaster, TicketPrinter};
