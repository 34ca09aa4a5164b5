//! End-to-end engine tests over an in-memory store and mock remotes.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use dhaba_core::{
    Bill, Channel, DiningTable, KitchenStation, KotRequest, MenuItem, OrderDetail, OrderMaster,
    OrderStatus, PaymentMethod, PrepareStatus, SyncMeta, SyncStatus, TableStatus, TaxSplit,
};
use dhaba_db::{Database, DbConfig};
use dhaba_engine::{
    BillingService, EngineError, IdAllocator, KotDispatcher, OrderLineRequest, OrderService,
    OrderUplink, RemoteError, RemoteResult, SessionContext, TaxMaster, TicketPrinter,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// =============================================================================
// Mock remotes
// =============================================================================

#[derive(Default)]
struct MockAllocator {
    next_order: AtomicI64,
    next_kot: AtomicI64,
    next_bill: AtomicI64,
    unreachable: AtomicBool,
}

impl MockAllocator {
    fn new() -> Self {
        MockAllocator {
            next_order: AtomicI64::new(1000),
            next_kot: AtomicI64::new(1),
            next_bill: AtomicI64::new(500),
            unreachable: AtomicBool::new(false),
        }
    }

    fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> RemoteResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(RemoteError::Unreachable("allocator offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdAllocator for MockAllocator {
    async fn allocate_order_id(&self, _: &str, _: &str, _: &str) -> RemoteResult<i64> {
        self.check()?;
        Ok(self.next_order.fetch_add(1, Ordering::SeqCst))
    }

    async fn allocate_kot_number(&self, _: &str) -> RemoteResult<i64> {
        self.check()?;
        Ok(self.next_kot.fetch_add(1, Ordering::SeqCst))
    }

    async fn get_bill_no(&self, _: &str, _: &str) -> RemoteResult<i64> {
        self.check()?;
        Ok(self.next_bill.fetch_add(1, Ordering::SeqCst))
    }
}

struct MockTaxMaster;

#[async_trait]
impl TaxMaster for MockTaxMaster {
    async fn get_tax_split(&self, tax_id: i64, _: &str) -> RemoteResult<TaxSplit> {
        Ok(TaxSplit {
            tax_id,
            cgst_per: dec("9"),
            sgst_per: dec("9"),
        })
    }
}

#[derive(Default)]
struct MockUplink {
    offline: AtomicBool,
    updated_line_ids: Mutex<Vec<String>>,
}

impl MockUplink {
    fn check(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unreachable("uplink offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderUplink for MockUplink {
    async fn create_order(&self, _: &OrderMaster) -> RemoteResult<()> {
        self.check()
    }

    async fn create_order_details(&self, _: &[OrderDetail]) -> RemoteResult<()> {
        self.check()
    }

    async fn update_order_details(&self, details: &[OrderDetail]) -> RemoteResult<()> {
        self.check()?;
        let mut updated = self.updated_line_ids.lock().unwrap();
        updated.extend(details.iter().map(|d| d.id.clone()));
        Ok(())
    }

    async fn update_table_availability(&self, _: &str, _: TableStatus) -> RemoteResult<()> {
        self.check()
    }

    async fn add_payment(&self, _: &Bill) -> RemoteResult<()> {
        self.check()
    }
}

#[derive(Default)]
struct MockPrinter {
    printed: Mutex<Vec<String>>,
    failing_addrs: Mutex<HashSet<String>>,
}

#[async_trait]
impl TicketPrinter for MockPrinter {
    async fn print_kot(&self, printer_addr: &str, request: &KotRequest) -> RemoteResult<()> {
        if self.failing_addrs.lock().unwrap().contains(printer_addr) {
            return Err(RemoteError::Unreachable(format!(
                "printer {printer_addr} offline"
            )));
        }
        self.printed
            .lock()
            .unwrap()
            .push(request.kitchen_cat_name.clone());
        Ok(())
    }

    async fn print_receipt(
        &self,
        printer_addr: &str,
        receipt: &dhaba_engine::BillReceipt,
    ) -> RemoteResult<()> {
        if self.failing_addrs.lock().unwrap().contains(printer_addr) {
            return Err(RemoteError::Unreachable(format!(
                "printer {printer_addr} offline"
            )));
        }
        self.printed
            .lock()
            .unwrap()
            .push(format!("receipt:{}", receipt.bill_no));
        Ok(())
    }
}

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    db: Database,
    allocator: Arc<MockAllocator>,
    uplink: Arc<MockUplink>,
    printer: Arc<MockPrinter>,
    orders: OrderService,
    billing: BillingService,
    ctx: SessionContext,
}

async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    seed(&db).await;

    let allocator = Arc::new(MockAllocator::new());
    let uplink = Arc::new(MockUplink::default());
    let printer = Arc::new(MockPrinter::default());

    let dispatcher = KotDispatcher::new(db.menu(), printer.clone());
    let orders = OrderService::new(
        db.clone(),
        allocator.clone(),
        Arc::new(MockTaxMaster),
        uplink.clone(),
        dispatcher,
    );
    let billing = BillingService::new(
        db.clone(),
        allocator.clone(),
        uplink.clone(),
        printer.clone(),
    );

    Fixture {
        db,
        allocator,
        uplink,
        printer,
        orders,
        billing,
        ctx: SessionContext::new("tenant-1", "counter-1", "waiter-1")
            .with_receipt_printer(RECEIPT_PRINTER),
    }
}

const RECEIPT_PRINTER: &str = "10.0.0.9:9100";

async fn seed(db: &Database) {
    db.tables()
        .upsert_from_remote(&DiningTable {
            id: "t1".to_string(),
            name: "Table 1".to_string(),
            status: TableStatus::Available,
            sync: SyncMeta::synced(Utc::now()),
        })
        .await
        .unwrap();

    // 100 inclusive of 18% GST: unit base 84.75, unit GST 15.25.
    db.menu()
        .upsert_item_from_remote(&MenuItem {
            id: "paneer".to_string(),
            name: "Paneer Tikka".to_string(),
            kitchen_cat_name: "Tandoor".to_string(),
            rate: dec("100"),
            ac_rate: dec("110"),
            parcel_rate: dec("95"),
            parcel_charge: dec("5"),
            tax_id: 1,
            gst_per: dec("18"),
            cess_per: Decimal::ZERO,
            cess_specific: Decimal::ZERO,
            is_inventory: false,
            is_gst_inclusive: true,
            is_active: true,
            sync: SyncMeta::synced(Utc::now()),
        })
        .await
        .unwrap();

    db.menu()
        .upsert_item_from_remote(&MenuItem {
            id: "lassi".to_string(),
            name: "Sweet Lassi".to_string(),
            kitchen_cat_name: "Beverages".to_string(),
            rate: dec("60"),
            ac_rate: dec("66"),
            parcel_rate: dec("60"),
            parcel_charge: Decimal::ZERO,
            tax_id: 1,
            gst_per: dec("18"),
            cess_per: Decimal::ZERO,
            cess_specific: Decimal::ZERO,
            is_inventory: false,
            is_gst_inclusive: true,
            is_active: true,
            sync: SyncMeta::synced(Utc::now()),
        })
        .await
        .unwrap();

    db.menu()
        .upsert_station(&KitchenStation {
            kitchen_cat_name: "Tandoor".to_string(),
            printer_addr: "10.0.0.1:9100".to_string(),
        })
        .await
        .unwrap();
    db.menu()
        .upsert_station(&KitchenStation {
            kitchen_cat_name: "Beverages".to_string(),
            printer_addr: "10.0.0.2:9100".to_string(),
        })
        .await
        .unwrap();
}

fn line(item: &str, qty: i64) -> OrderLineRequest {
    OrderLineRequest {
        menu_item_id: item.to_string(),
        qty,
    }
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn test_dine_in_placement_prices_and_occupies() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 2)], None)
        .await
        .unwrap();

    assert_eq!(placed.master.channel, Channel::DineIn { ac: false });
    assert_eq!(placed.kot_number, 1);
    assert_eq!(placed.details.len(), 1);

    let d = &placed.details[0];
    assert_eq!(d.rate, dec("84.75"));
    assert_eq!(d.tax_amount, dec("30.50"));
    assert_eq!(d.cgst, dec("7.63"));
    assert_eq!(d.sgst, dec("7.63"));
    assert_eq!(d.igst, Decimal::ZERO);
    assert_eq!(d.grand_total, dec("200.00"));
    assert_eq!(d.parcel_charge, Decimal::ZERO);

    let table = f.db.tables().get("t1").await.unwrap().unwrap();
    assert_eq!(table.status, TableStatus::Occupied);

    // Ticket went to the Tandoor station.
    assert_eq!(
        *f.printer.printed.lock().unwrap(),
        vec!["Tandoor".to_string()]
    );
    assert!(placed.kot_report.unwrap().is_complete());
}

#[tokio::test]
async fn test_second_batch_reuses_order_with_new_kot() {
    let f = fixture().await;

    let first = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let second = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("lassi", 2)], None)
        .await
        .unwrap();

    assert_eq!(first.master.order_master_id, second.master.order_master_id);
    assert_eq!(first.kot_number, 1);
    assert_eq!(second.kot_number, 2);

    let lines = f
        .db
        .orders()
        .list_open_details(first.master.order_master_id)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_takeaway_never_reuses_order() {
    let f = fixture().await;

    let first = f
        .orders
        .place_or_update_order(&f.ctx, None, "PARCEL", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let second = f
        .orders
        .place_or_update_order(&f.ctx, None, "PARCEL", &[line("paneer", 1)], None)
        .await
        .unwrap();

    assert_ne!(first.master.order_master_id, second.master.order_master_id);
    assert!(first.master.table_id.is_none());
    // Parcel price tier applies, packing charge snapshotted on the line.
    assert_eq!(first.details[0].actual_rate, dec("95"));
    assert_eq!(first.details[0].parcel_charge, dec("5"));
}

#[tokio::test]
async fn test_delivery_routes_igst() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, None, "DELIVERY", &[line("paneer", 1)], None)
        .await
        .unwrap();

    let d = &placed.details[0];
    assert_eq!(d.igst_per, dec("18"));
    assert_eq!(d.cgst, Decimal::ZERO);
    assert_eq!(d.sgst, Decimal::ZERO);
    assert!(d.igst > Decimal::ZERO);
}

#[tokio::test]
async fn test_empty_batch_rejected_before_io() {
    let f = fixture().await;

    let err = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyOrder));
}

#[tokio::test]
async fn test_allocator_failure_commits_nothing() {
    let f = fixture().await;
    f.allocator.go_offline();

    let err = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Allocation(_)));

    // No partial commit: no order, table untouched.
    assert!(f.db.orders().find_running_by_table("t1").await.unwrap().is_none());
    let table = f.db.tables().get("t1").await.unwrap().unwrap();
    assert_eq!(table.status, TableStatus::Available);
}

#[tokio::test]
async fn test_offline_uplink_leaves_rows_pending() {
    let f = fixture().await;
    f.uplink.offline.store(true, Ordering::SeqCst);

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();

    let master = f
        .db
        .orders()
        .get_master(placed.master.order_master_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(master.sync.sync_status, SyncStatus::PendingSync);
}

#[tokio::test]
async fn test_online_push_retags_synced() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();

    let master = f
        .db
        .orders()
        .get_master(placed.master.order_master_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(master.sync.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn test_kot_disabled_marks_lines_ready() {
    let f = fixture().await;
    let ctx = f.ctx.clone().with_kot_enabled(false);

    let placed = f
        .orders
        .place_or_update_order(&ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();

    assert!(placed.kot_report.is_none());
    assert!(f.printer.printed.lock().unwrap().is_empty());
    let lines = f
        .db
        .orders()
        .list_open_details(placed.master.order_master_id)
        .await
        .unwrap();
    assert_eq!(lines[0].prepare_status, PrepareStatus::Ready);
}

#[tokio::test]
async fn test_kot_partial_failure_keeps_order() {
    let f = fixture().await;
    f.printer
        .failing_addrs
        .lock()
        .unwrap()
        .insert("10.0.0.2:9100".to_string());

    let placed = f
        .orders
        .place_or_update_order(
            &f.ctx,
            Some("t1"),
            "",
            &[line("paneer", 1), line("lassi", 1)],
            None,
        )
        .await
        .unwrap();

    let report = placed.kot_report.unwrap();
    assert_eq!(report.printed, vec!["Tandoor".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kitchen_cat_name, "Beverages");

    // The order itself is intact.
    let lines = f
        .db
        .orders()
        .list_open_details(placed.master.order_master_id)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_table_read_failure_after_commit_degrades_ticket_header() {
    let f = fixture().await;

    f.orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();

    // Break the table row so the ticket-header lookup errors out. The
    // append path never touches dining_tables, so the damage survives.
    sqlx::query("UPDATE dining_tables SET sync_attempts = 'x' WHERE id = 't1'")
        .execute(f.db.pool())
        .await
        .unwrap();
    assert!(f.db.tables().get("t1").await.is_err());

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("lassi", 1)], None)
        .await
        .unwrap();

    // The batch committed and its ticket still went out.
    assert!(placed.kot_report.unwrap().is_complete());
    let lines = f
        .db
        .orders()
        .list_open_details(placed.master.order_master_id)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_cancel_line_pushes_update_and_retags() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let detail_id = placed.details[0].id.clone();

    f.orders.cancel_line(&detail_id).await.unwrap();

    assert_eq!(*f.uplink.updated_line_ids.lock().unwrap(), vec![detail_id.clone()]);
    let detail = f.db.orders().get_detail(&detail_id).await.unwrap().unwrap();
    assert!(detail.is_flag);
    assert_eq!(detail.sync.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn test_cancel_line_offline_stays_pending() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let detail_id = placed.details[0].id.clone();
    f.uplink.offline.store(true, Ordering::SeqCst);

    f.orders.cancel_line(&detail_id).await.unwrap();

    assert!(f.uplink.updated_line_ids.lock().unwrap().is_empty());
    let detail = f.db.orders().get_detail(&detail_id).await.unwrap().unwrap();
    assert!(detail.is_flag);
    assert_eq!(detail.sync.sync_status, SyncStatus::PendingUpdate);
}

// =============================================================================
// Billing
// =============================================================================

#[tokio::test]
async fn test_cash_bill_completes_and_releases() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 2)], None)
        .await
        .unwrap();
    let order_id = placed.master.order_master_id;

    let outcome = f
        .billing
        .create_bill(&f.ctx, order_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    let bill = &outcome.bill;
    assert_eq!(bill.bill_no, 500);
    assert_eq!(bill.order_amt, dec("169.50"));
    assert_eq!(bill.tax_amt, dec("30.50"));
    assert_eq!(bill.grand_total, dec("200.00"));
    assert_eq!(bill.rounded_amt, dec("200.00"));
    assert_eq!(bill.cash, dec("200.00"));
    assert_eq!(bill.received_amt, dec("200.00"));
    assert_eq!(bill.pending_amt, Decimal::ZERO);

    let master = f.db.orders().get_master(order_id).await.unwrap().unwrap();
    assert_eq!(master.status, OrderStatus::Completed);
    let table = f.db.tables().get("t1").await.unwrap().unwrap();
    assert_eq!(table.status, TableStatus::Available);

    // Receipt payload mirrors the bill and went to the counter printer.
    assert_eq!(outcome.receipt.lines.len(), 1);
    assert_eq!(outcome.receipt.lines[0].amount, dec("200.00"));
    assert_eq!(outcome.receipt.rounded_amt, dec("200.00"));
    assert!(f
        .printer
        .printed
        .lock()
        .unwrap()
        .contains(&"receipt:500".to_string()));
}

#[tokio::test]
async fn test_dead_receipt_printer_does_not_fail_bill() {
    let f = fixture().await;
    f.printer
        .failing_addrs
        .lock()
        .unwrap()
        .insert(RECEIPT_PRINTER.to_string());

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let order_id = placed.master.order_master_id;

    let outcome = f
        .billing
        .create_bill(&f.ctx, order_id, PaymentMethod::Cash, None)
        .await
        .unwrap();

    // Bill committed, receipt payload still returned, nothing printed.
    assert_eq!(outcome.bill.bill_no, 500);
    assert_eq!(outcome.receipt.rounded_amt, dec("100.00"));
    assert!(!f
        .printer
        .printed
        .lock()
        .unwrap()
        .iter()
        .any(|p| p.starts_with("receipt:")));
    let master = f.db.orders().get_master(order_id).await.unwrap().unwrap();
    assert_eq!(master.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_due_bill_inverts_received_pending() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();

    let outcome = f
        .billing
        .create_bill(
            &f.ctx,
            placed.master.order_master_id,
            PaymentMethod::Due,
            Some("Regular customer".to_string()),
        )
        .await
        .unwrap();

    let bill = &outcome.bill;
    assert_eq!(bill.due, dec("100.00"));
    assert_eq!(bill.received_amt, Decimal::ZERO);
    assert_eq!(bill.pending_amt, dec("100.00"));
    assert_eq!(bill.customer_name.as_deref(), Some("Regular customer"));
}

#[tokio::test]
async fn test_second_checkout_is_already_billed() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let order_id = placed.master.order_master_id;

    f.billing
        .create_bill(&f.ctx, order_id, PaymentMethod::Cash, None)
        .await
        .unwrap();
    let err = f
        .billing
        .create_bill(&f.ctx, order_id, PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyBilled(id) if id == order_id));
}

#[tokio::test]
async fn test_billing_all_lines_flagged_is_no_open_order() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    f.orders.cancel_line(&placed.details[0].id).await.unwrap();

    let err = f
        .billing
        .create_bill(&f.ctx, placed.master.order_master_id, PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoOpenOrder(_)));
}

#[tokio::test]
async fn test_bill_number_allocator_failure_commits_nothing() {
    let f = fixture().await;

    let placed = f
        .orders
        .place_or_update_order(&f.ctx, Some("t1"), "", &[line("paneer", 1)], None)
        .await
        .unwrap();
    let order_id = placed.master.order_master_id;
    f.allocator.go_offline();

    let err = f
        .billing
        .create_bill(&f.ctx, order_id, PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Allocation(_)));

    // Order still running, table still occupied, no bill.
    let master = f.db.orders().get_master(order_id).await.unwrap().unwrap();
    assert_eq!(master.status, OrderStatus::Running);
    assert!(f.db.bills().get_by_order(order_id).await.unwrap().is_none());
}
