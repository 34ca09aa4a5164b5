//! # Order State Coordinator
//!
//! Resolve-or-create order placement:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ place_or_update_order(table, channel, items)                        │
//! │    │                                                                │
//! │    ├─ 1. validate (non-empty, qty bounds)        no I/O             │
//! │    ├─ 2. resolve RUNNING order (dine-in only)    local store        │
//! │    ├─ 3. allocate order id / KOT number          remote, aborting   │
//! │    ├─ 4. price every line                        dhaba-core         │
//! │    ├─ 5. persist master + lines + table flip     one transaction    │
//! │    ├─ 6. push to uplink                          best-effort        │
//! │    └─ 7. dispatch kitchen tickets                best-effort        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-5 are all-or-nothing. Steps 6-7 never fail the operation; the
//! reconciler and per-category KOT retry own those follow-ups.
//!
//! Two terminals may both observe "no running order" for a table and
//! both reach step 3; the remote allocator is the arbiter of that race,
//! with the local running-per-table index as a single-terminal backstop.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::SessionContext;
use crate::error::{EngineError, EngineResult};
use crate::kot::{KotDispatchReport, KotDispatcher};
use crate::remote::{IdAllocator, OrderUplink, TaxMaster};
use dhaba_core::{
    build_kot_batches, price_line, validation, Channel, KotRequest, MenuItem, OrderDetail,
    OrderMaster, OrderStatus, PrepareStatus, SyncMeta, TaxSplit,
};
use dhaba_db::Database;
use rust_decimal::Decimal;

/// One requested line of a placement: which item, how many.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub menu_item_id: String,
    pub qty: i64,
}

/// Result of a successful placement.
#[derive(Debug)]
pub struct PlacedOrder {
    pub master: OrderMaster,
    /// The lines persisted by this placement (not prior batches).
    pub details: Vec<OrderDetail>,
    /// KOT number shared by this batch.
    pub kot_number: i64,
    /// Ticket dispatch outcome. `None` when KOT printing is disabled.
    pub kot_report: Option<KotDispatchReport>,
}

/// Coordinates the order lifecycle over the local store and the remote
/// collaborators.
pub struct OrderService {
    db: Database,
    allocator: Arc<dyn IdAllocator>,
    tax_master: Arc<dyn TaxMaster>,
    uplink: Arc<dyn OrderUplink>,
    dispatcher: KotDispatcher,
}

impl OrderService {
    pub fn new(
        db: Database,
        allocator: Arc<dyn IdAllocator>,
        tax_master: Arc<dyn TaxMaster>,
        uplink: Arc<dyn OrderUplink>,
        dispatcher: KotDispatcher,
    ) -> Self {
        OrderService {
            db,
            allocator,
            tax_master,
            uplink,
            dispatcher,
        }
    }

    /// Places a batch of items, creating a new order or appending to the
    /// table's running one.
    ///
    /// Dine-in reuses the table's RUNNING order when one exists;
    /// takeaway and delivery always open a new order. Every line of the
    /// batch shares one freshly allocated KOT number.
    ///
    /// ## Errors
    /// - [`EngineError::EmptyOrder`] for an empty batch, before any I/O.
    /// - [`EngineError::Allocation`] when a remote allocator is
    ///   unreachable; nothing is committed locally in that case.
    /// - [`EngineError::NotFound`] when `existing_order_id`, the table or
    ///   a menu item does not resolve.
    pub async fn place_or_update_order(
        &self,
        ctx: &SessionContext,
        table_id: Option<&str>,
        channel: &str,
        items: &[OrderLineRequest],
        existing_order_id: Option<i64>,
    ) -> EngineResult<PlacedOrder> {
        if items.is_empty() {
            return Err(EngineError::EmptyOrder);
        }
        validation::validate_order_lines(items.len())?;
        for item in items {
            validation::validate_quantity(item.qty)?;
        }

        let channel = Channel::parse(channel);
        let table_id = if channel.is_dine_in() { table_id } else { None };

        // Resolve the order this batch lands on.
        let existing = self.resolve_existing(channel, table_id, existing_order_id).await?;

        // Remote allocation happens before any local write so an
        // unreachable allocator aborts with nothing committed.
        let kot_number = self
            .allocator
            .allocate_kot_number(&ctx.tenant)
            .await
            .map_err(|e| EngineError::Allocation(e.to_string()))?;

        let is_new = existing.is_none();
        let master = match existing {
            Some(master) => master,
            None => {
                let order_master_id = self
                    .allocator
                    .allocate_order_id(&ctx.tenant, &ctx.counter_id, channel.as_str())
                    .await
                    .map_err(|e| EngineError::Allocation(e.to_string()))?;
                OrderMaster {
                    order_master_id,
                    channel,
                    table_id: table_id.map(str::to_string),
                    staff_id: ctx.operator_id.clone(),
                    status: OrderStatus::Running,
                    created_at: Utc::now(),
                    completed_at: None,
                    sync: SyncMeta::pending_sync(Utc::now()),
                }
            }
        };

        let details = self.price_batch(ctx, &master, channel, items, kot_number).await?;

        // All-or-nothing local commit.
        if is_new {
            self.db.orders().create_order(&master, &details).await?;
        } else {
            self.db.orders().append_details(master.order_master_id, &details).await?;
        }

        self.push_best_effort(&master, &details, is_new).await;

        let kot_report = if ctx.kot_enabled {
            let batches = self.build_batches(ctx, &master, &details).await;
            Some(self.dispatcher.dispatch(&batches).await)
        } else {
            // No tickets: the lines were already persisted as ready.
            None
        };

        info!(
            order_id = master.order_master_id,
            kot_number,
            lines = details.len(),
            channel = channel.as_str(),
            "Order batch placed"
        );

        Ok(PlacedOrder {
            master,
            details,
            kot_number,
            kot_report,
        })
    }

    /// Cancels one line of a running order.
    ///
    /// The flagged row is pushed best-effort right away; on failure it
    /// stays `pending_update` for the reconciler.
    pub async fn cancel_line(&self, detail_id: &str) -> EngineResult<()> {
        self.db.orders().cancel_detail(detail_id).await?;

        if let Some(detail) = self.db.orders().get_detail(detail_id).await? {
            match self
                .uplink
                .update_order_details(std::slice::from_ref(&detail))
                .await
            {
                Ok(()) => {
                    if let Err(e) = self.db.orders().mark_detail_synced(detail_id).await {
                        warn!(detail_id = %detail_id, error = %e, "Failed to retag cancelled line");
                    }
                }
                Err(e) => {
                    warn!(
                        detail_id = %detail_id,
                        error = %e,
                        "Line cancellation push deferred to reconciler"
                    );
                }
            }
        }
        Ok(())
    }

    /// Cancels a whole running order and releases its table.
    pub async fn cancel_order(&self, order_master_id: i64) -> EngineResult<()> {
        self.db.orders().cancel_order(order_master_id).await?;
        Ok(())
    }

    /// The open order on a table, served local-first.
    pub async fn open_order_for_table(&self, table_id: &str) -> EngineResult<Option<OrderMaster>> {
        Ok(self.db.orders().find_running_by_table(table_id).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn resolve_existing(
        &self,
        channel: Channel,
        table_id: Option<&str>,
        existing_order_id: Option<i64>,
    ) -> EngineResult<Option<OrderMaster>> {
        if let Some(id) = existing_order_id {
            let master = self
                .db
                .orders()
                .get_master(id)
                .await?
                .filter(|m| m.status == OrderStatus::Running)
                .ok_or_else(|| EngineError::not_found("RunningOrder", id))?;
            return Ok(Some(master));
        }

        // Takeaway/delivery never reuse a prior order.
        if !channel.is_dine_in() {
            return Ok(None);
        }

        match table_id {
            Some(table_id) => {
                let found = self.db.orders().find_running_by_table(table_id).await?;
                if let Some(master) = &found {
                    debug!(
                        table_id = %table_id,
                        order_id = master.order_master_id,
                        "Reusing running order on table"
                    );
                }
                Ok(found)
            }
            None => Err(EngineError::not_found("Table", "<missing>")),
        }
    }

    async fn price_batch(
        &self,
        ctx: &SessionContext,
        master: &OrderMaster,
        channel: Channel,
        items: &[OrderLineRequest],
        kot_number: i64,
    ) -> EngineResult<Vec<OrderDetail>> {
        let now = Utc::now();
        let mut details = Vec::with_capacity(items.len());

        for request in items {
            let item = self
                .db
                .menu()
                .get_item(&request.menu_item_id)
                .await?
                .ok_or_else(|| EngineError::not_found("MenuItem", &request.menu_item_id))?;

            let split = self.resolve_tax_split(ctx, &item, channel).await?;
            let priced = price_line(&item, channel, &split, request.qty, ctx.precision)?;

            details.push(OrderDetail {
                id: Uuid::new_v4().to_string(),
                order_master_id: master.order_master_id,
                menu_item_id: item.id.clone(),
                item_name: item.name.clone(),
                kitchen_cat_name: item.kitchen_cat_name.clone(),
                kot_number,
                qty: request.qty,
                rate: priced.rate,
                actual_rate: priced.actual_rate,
                parcel_charge: priced.parcel_charge,
                tax_id: priced.tax_id,
                gst_per: priced.gst_per,
                tax_amount: priced.tax_amount,
                cgst_per: priced.cgst_per,
                sgst_per: priced.sgst_per,
                cgst: priced.cgst,
                sgst: priced.sgst,
                igst_per: priced.igst_per,
                igst: priced.igst,
                cess_per: priced.cess_per,
                cess: priced.cess,
                cess_specific: priced.cess_specific,
                grand_total: priced.grand_total,
                prepare_status: if ctx.kot_enabled {
                    PrepareStatus::Pending
                } else {
                    PrepareStatus::Ready
                },
                is_flag: false,
                created_at: now,
                sync: SyncMeta::pending_sync(now),
            });
        }

        Ok(details)
    }

    /// Tax split for the line, local cache first, remote on miss.
    ///
    /// Interstate channels route the whole rate to IGST and never
    /// consult the split.
    async fn resolve_tax_split(
        &self,
        ctx: &SessionContext,
        item: &MenuItem,
        channel: Channel,
    ) -> EngineResult<TaxSplit> {
        if channel.is_interstate() {
            return Ok(TaxSplit {
                tax_id: item.tax_id,
                cgst_per: Decimal::ZERO,
                sgst_per: Decimal::ZERO,
            });
        }

        if let Some(split) = self.db.menu().get_tax_split(item.tax_id).await? {
            return Ok(split);
        }

        let split = self
            .tax_master
            .get_tax_split(item.tax_id, &ctx.tenant)
            .await
            .map_err(|e| EngineError::Allocation(e.to_string()))?;
        self.db.menu().cache_tax_split(&split).await?;
        Ok(split)
    }

    /// Immediate push after the local commit. Failures only log; the
    /// rows stay `pending_*` and the reconciler picks them up.
    async fn push_best_effort(&self, master: &OrderMaster, details: &[OrderDetail], is_new: bool) {
        let pushed = if is_new {
            match self.uplink.create_order(master).await {
                Ok(()) => self.uplink.create_order_details(details).await,
                Err(e) => Err(e),
            }
        } else {
            self.uplink.create_order_details(details).await
        };

        match pushed {
            Ok(()) => {
                if is_new {
                    if let Err(e) = self.db.orders().mark_master_synced(master.order_master_id).await
                    {
                        warn!(order_id = master.order_master_id, error = %e, "Failed to retag pushed order");
                        return;
                    }
                }
                for detail in details {
                    if let Err(e) = self.db.orders().mark_detail_synced(&detail.id).await {
                        warn!(detail_id = %detail.id, error = %e, "Failed to retag pushed line");
                    }
                }
            }
            Err(e) => {
                warn!(
                    order_id = master.order_master_id,
                    error = %e,
                    "Order push deferred to reconciler"
                );
            }
        }
    }

    async fn build_batches(
        &self,
        ctx: &SessionContext,
        master: &OrderMaster,
        details: &[OrderDetail],
    ) -> BTreeMap<String, KotRequest> {
        // Ticket header: table name for dine-in, channel label otherwise.
        // The order is committed by now, so a failed table read must not
        // surface as an error; the header degrades to the raw id.
        let label = match &master.table_id {
            Some(table_id) => match self.db.tables().get(table_id).await {
                Ok(Some(table)) => table.name,
                Ok(None) => table_id.clone(),
                Err(e) => {
                    warn!(table_id = %table_id, error = %e, "Table lookup for ticket header failed");
                    table_id.clone()
                }
            },
            None => master.channel.ticket_label().to_string(),
        };

        build_kot_batches(details, &label, &ctx.operator_name, Utc::now())
    }
}
