//! # Billing Aggregator
//!
//! Checkout: folds every still-open line of an order into one payable
//! bill, allocates the grand total to a single payment method, finalizes
//! atomically (bill row + order completion + table release) and assembles
//! the printable receipt payload.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::SessionContext;
use crate::error::{EngineError, EngineResult};
use crate::remote::{IdAllocator, OrderUplink, TicketPrinter};
use dhaba_core::money::round;
use dhaba_core::{Bill, OrderDetail, PaymentMethod, SyncMeta, TableStatus};
use dhaba_db::Database;
use serde::{Deserialize, Serialize};

/// One printable receipt line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub item_name: String,
    pub qty: i64,
    /// Per-unit base price.
    pub rate: Decimal,
    /// Line payable amount.
    pub amount: Decimal,
}

/// Fully-formed receipt payload handed to the printer collaborator.
/// Physical rendering stays behind the printer trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillReceipt {
    pub bill_no: i64,
    pub order_master_id: i64,
    pub counter_id: String,
    pub customer_name: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub order_amt: Decimal,
    pub tax_amt: Decimal,
    pub cess: Decimal,
    pub grand_total: Decimal,
    pub rounded_amt: Decimal,
    pub payment_method: PaymentMethod,
    pub created_at: chrono::DateTime<Utc>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct BillOutcome {
    pub bill: Bill,
    pub receipt: BillReceipt,
}

/// Creates bills and finalizes orders.
pub struct BillingService {
    db: Database,
    allocator: Arc<dyn IdAllocator>,
    uplink: Arc<dyn OrderUplink>,
    printer: Arc<dyn TicketPrinter>,
}

impl BillingService {
    pub fn new(
        db: Database,
        allocator: Arc<dyn IdAllocator>,
        uplink: Arc<dyn OrderUplink>,
        printer: Arc<dyn TicketPrinter>,
    ) -> Self {
        BillingService {
            db,
            allocator,
            uplink,
            printer,
        }
    }

    /// Bills an order.
    ///
    /// The full grand total lands on exactly one payment column. `Due`
    /// receives nothing now (`received_amt = 0`, `pending_amt` = grand
    /// total); every other method is the inverse. The bill row, the
    /// order's transition to Completed and the table release commit in
    /// one transaction.
    ///
    /// ## Errors
    /// - [`EngineError::AlreadyBilled`] when a bill row exists.
    /// - [`EngineError::NoOpenOrder`] when every line is flagged.
    /// - [`EngineError::Allocation`] when the bill-number allocator is
    ///   unreachable; nothing is committed in that case.
    pub async fn create_bill(
        &self,
        ctx: &SessionContext,
        order_master_id: i64,
        payment_method: PaymentMethod,
        customer_name: Option<String>,
    ) -> EngineResult<BillOutcome> {
        let master = self
            .db
            .orders()
            .get_master(order_master_id)
            .await?
            .ok_or_else(|| EngineError::not_found("OrderMaster", order_master_id))?;

        if self.db.bills().exists_for_order(order_master_id).await? {
            return Err(EngineError::AlreadyBilled(order_master_id));
        }

        let details = self.db.orders().list_open_details(order_master_id).await?;
        if details.is_empty() {
            return Err(EngineError::NoOpenOrder(order_master_id));
        }

        let totals = BillTotals::aggregate(&details);
        let grand_total = totals.grand_total;
        let rounded_amt = round(grand_total, ctx.precision);

        // Remote allocation before the local commit.
        let bill_no = self
            .allocator
            .get_bill_no(&ctx.counter_id, &ctx.tenant)
            .await
            .map_err(|e| EngineError::Allocation(e.to_string()))?;

        let now = Utc::now();
        let mut bill = Bill {
            id: Uuid::new_v4().to_string(),
            bill_no,
            order_master_id,
            counter_id: ctx.counter_id.clone(),
            order_amt: totals.order_amt,
            tax_amt: totals.tax_amt,
            cess: totals.cess,
            grand_total,
            rounded_amt,
            cash: Decimal::ZERO,
            card: Decimal::ZERO,
            upi: Decimal::ZERO,
            due: Decimal::ZERO,
            others: Decimal::ZERO,
            received_amt: grand_total,
            pending_amt: Decimal::ZERO,
            customer_name,
            created_at: now,
            sync: SyncMeta::pending_sync(now),
        };
        match payment_method {
            PaymentMethod::Cash => bill.cash = grand_total,
            PaymentMethod::Card => bill.card = grand_total,
            PaymentMethod::Upi => bill.upi = grand_total,
            PaymentMethod::Others => bill.others = grand_total,
            PaymentMethod::Due => {
                bill.due = grand_total;
                bill.received_amt = Decimal::ZERO;
                bill.pending_amt = grand_total;
            }
        }

        self.db
            .bills()
            .create_bill_and_complete(&bill, master.table_id.as_deref())
            .await
            .map_err(|e| match e {
                // Lost the race to another checkout of the same order.
                dhaba_db::DbError::UniqueViolation { .. } => {
                    EngineError::AlreadyBilled(order_master_id)
                }
                other => EngineError::Db(other),
            })?;

        self.push_best_effort(&bill, master.table_id.as_deref()).await;

        let receipt = assemble_receipt(&bill, payment_method, &details);

        // The bill is committed; a dead receipt printer only warns.
        if let Some(addr) = &ctx.receipt_printer {
            if let Err(e) = self.printer.print_receipt(addr, &receipt).await {
                warn!(bill_no, printer_addr = %addr, error = %e, "Receipt print failed");
            }
        }

        info!(
            bill_no,
            order_id = order_master_id,
            rounded_amt = %rounded_amt,
            method = ?payment_method,
            "Bill created"
        );

        Ok(BillOutcome { bill, receipt })
    }

    /// Immediate push after the local commit. Failures only log; the
    /// reconciler owns the retry.
    async fn push_best_effort(&self, bill: &Bill, table_id: Option<&str>) {
        match self.uplink.add_payment(bill).await {
            Ok(()) => {
                if let Err(e) = self.db.bills().mark_synced(&bill.id).await {
                    warn!(bill_no = bill.bill_no, error = %e, "Failed to retag pushed bill");
                }
            }
            Err(e) => {
                warn!(bill_no = bill.bill_no, error = %e, "Bill push deferred to reconciler");
                return;
            }
        }

        if let Some(table_id) = table_id {
            if let Err(e) = self
                .uplink
                .update_table_availability(table_id, TableStatus::Available)
                .await
            {
                warn!(table_id = %table_id, error = %e, "Table release push deferred");
            } else if let Err(e) = self.db.tables().mark_synced(table_id).await {
                warn!(table_id = %table_id, error = %e, "Failed to retag pushed table");
            }
        }
    }
}

struct BillTotals {
    order_amt: Decimal,
    tax_amt: Decimal,
    cess: Decimal,
    grand_total: Decimal,
}

impl BillTotals {
    /// Component sums across the open lines. `cess` folds the percentage
    /// cess line amounts together with the flat per-unit addends.
    fn aggregate(details: &[OrderDetail]) -> BillTotals {
        let mut totals = BillTotals {
            order_amt: Decimal::ZERO,
            tax_amt: Decimal::ZERO,
            cess: Decimal::ZERO,
            grand_total: Decimal::ZERO,
        };
        for d in details {
            let qty = Decimal::from(d.qty);
            totals.order_amt += d.rate * qty;
            totals.tax_amt += d.tax_amount;
            totals.cess += d.cess + d.cess_specific * qty;
            totals.grand_total += d.grand_total;
        }
        totals
    }
}

fn assemble_receipt(
    bill: &Bill,
    payment_method: PaymentMethod,
    details: &[OrderDetail],
) -> BillReceipt {
    BillReceipt {
        bill_no: bill.bill_no,
        order_master_id: bill.order_master_id,
        counter_id: bill.counter_id.clone(),
        customer_name: bill.customer_name.clone(),
        lines: details
            .iter()
            .map(|d| ReceiptLine {
                item_name: d.item_name.clone(),
                qty: d.qty,
                rate: d.rate,
                amount: d.grand_total,
            })
            .collect(),
        order_amt: bill.order_amt,
        tax_amt: bill.tax_amt,
        cess: bill.cess,
        grand_total: bill.grand_total,
        rounded_amt: bill.rounded_amt,
        payment_method,
        created_at: bill.created_at,
    }
}
