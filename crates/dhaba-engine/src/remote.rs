//! # Remote Collaborator Contracts
//!
//! Transport-agnostic async traits for everything the engine consumes
//! from outside the terminal: numeric-id allocators, the tax master,
//! the order uplink and the ticket printers.
//!
//! The remote system is the final arbiter of every numeric identifier
//! (order id, KOT number, bill number) — the engine never fabricates
//! these locally. Allocator failures abort the whole operation; uplink
//! push failures after a local commit do not (reconciliation retries).

use async_trait::async_trait;
use thiserror::Error;

use crate::billing::BillReceipt;
use dhaba_core::{Bill, KotRequest, OrderDetail, OrderMaster, TableStatus, TaxSplit};

/// Remote call failures.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (offline, timeout, connection refused).
    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    /// The remote answered with an application-level rejection.
    #[error("Remote rejected request: {0}")]
    Rejected(String),
}

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Allocates the numeric identifiers owned by the remote system.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Allocates a fresh order id for the tenant/counter.
    async fn allocate_order_id(
        &self,
        tenant: &str,
        counter_id: &str,
        channel: &str,
    ) -> RemoteResult<i64>;

    /// Allocates the next KOT number for the tenant.
    async fn allocate_kot_number(&self, tenant: &str) -> RemoteResult<i64>;

    /// Allocates the next bill number for the counter.
    async fn get_bill_no(&self, counter_id: &str, tenant: &str) -> RemoteResult<i64>;
}

/// Serves CGST/SGST percentage splits per tax id.
///
/// Results are cached locally (`MenuRepository::cache_tax_split`) so
/// pricing keeps working offline after first hydration.
#[async_trait]
pub trait TaxMaster: Send + Sync {
    async fn get_tax_split(&self, tax_id: i64, tenant: &str) -> RemoteResult<TaxSplit>;
}

/// Push side of the remote order store.
///
/// Called best-effort right after a local commit and again by the
/// reconciler for rows still pending. Open-order resolution is local
/// only: the running-per-table index is the single-terminal source of
/// truth, so the uplink carries no read surface.
#[async_trait]
pub trait OrderUplink: Send + Sync {
    async fn create_order(&self, master: &OrderMaster) -> RemoteResult<()>;

    async fn create_order_details(&self, details: &[OrderDetail]) -> RemoteResult<()>;

    /// Pushes mutated lines (cancellation flags, status changes).
    async fn update_order_details(&self, details: &[OrderDetail]) -> RemoteResult<()>;

    async fn update_table_availability(
        &self,
        table_id: &str,
        status: TableStatus,
    ) -> RemoteResult<()>;

    async fn add_payment(&self, bill: &Bill) -> RemoteResult<()>;
}

/// Dispatches formed ticket payloads to a station printer by address.
/// Physical rendering lives behind this trait, out of scope here.
#[async_trait]
pub trait TicketPrinter: Send + Sync {
    async fn print_kot(&self, printer_addr: &str, request: &KotRequest) -> RemoteResult<()>;

    async fn print_receipt(&self, printer_addr: &str, receipt: &BillReceipt) -> RemoteResult<()>;
}
