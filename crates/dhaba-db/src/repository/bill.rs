//! # Bill Repository
//!
//! Bill persistence and the checkout finalization transaction. A bill is
//! written exactly once per order; the `order_master_id` UNIQUE constraint
//! backs the application-level duplicate check.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::order::occupy_table;
use crate::repository::{
    decimal_bind, decimal_col, mark_row_synced, record_row_sync_failure, sync_meta_col,
};
use dhaba_core::{Bill, OrderStatus, SyncStatus, TableStatus};

/// Repository for bill operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Gets the bill for an order, if one was already created.
    pub async fn get_by_order(&self, order_master_id: i64) -> DbResult<Option<Bill>> {
        let row = sqlx::query("SELECT * FROM bills WHERE order_master_id = ?1")
            .bind(order_master_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_bill(&r)).transpose()
    }

    /// Whether an order has already been billed.
    pub async fn exists_for_order(&self, order_master_id: i64) -> DbResult<bool> {
        Ok(self.get_by_order(order_master_id).await?.is_some())
    }

    /// Finalizes a checkout.
    ///
    /// Single transaction: the bill insert, the order's transition to
    /// Completed and (for dine-in) the table release commit together.
    /// A concurrent bill for the same order surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn create_bill_and_complete(
        &self,
        bill: &Bill,
        table_id: Option<&str>,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = bill.created_at;

        sqlx::query(
            r#"
            INSERT INTO bills (
                id, bill_no, order_master_id, counter_id,
                order_amt, tax_amt, cess, grand_total, rounded_amt,
                cash, card, upi, due, others, received_amt, pending_amt,
                customer_name, created_at,
                sync_status, sync_attempts, sync_error, last_modified
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, 0, NULL, ?20
            )
            "#,
        )
        .bind(&bill.id)
        .bind(bill.bill_no)
        .bind(bill.order_master_id)
        .bind(&bill.counter_id)
        .bind(decimal_bind(bill.order_amt))
        .bind(decimal_bind(bill.tax_amt))
        .bind(decimal_bind(bill.cess))
        .bind(decimal_bind(bill.grand_total))
        .bind(decimal_bind(bill.rounded_amt))
        .bind(decimal_bind(bill.cash))
        .bind(decimal_bind(bill.card))
        .bind(decimal_bind(bill.upi))
        .bind(decimal_bind(bill.due))
        .bind(decimal_bind(bill.others))
        .bind(decimal_bind(bill.received_amt))
        .bind(decimal_bind(bill.pending_amt))
        .bind(&bill.customer_name)
        .bind(bill.created_at)
        .bind(bill.sync.sync_status)
        .bind(bill.sync.last_modified)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE order_master SET
                status = ?2, completed_at = ?3,
                sync_status = ?4, sync_attempts = 0, last_modified = ?3
            WHERE order_master_id = ?1 AND status = ?5
            "#,
        )
        .bind(bill.order_master_id)
        .bind(OrderStatus::Completed)
        .bind(now)
        .bind(SyncStatus::PendingUpdate)
        .bind(OrderStatus::Running)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RunningOrder", bill.order_master_id));
        }

        if let Some(table_id) = table_id {
            occupy_table(&mut tx, table_id, TableStatus::Available).await?;
        }

        tx.commit().await?;

        info!(
            bill_no = bill.bill_no,
            order_id = bill.order_master_id,
            rounded_amt = %bill.rounded_amt,
            "Bill finalized"
        );
        Ok(())
    }

    /// Lists bills awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_sync(&self, limit: u32) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM bills
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_bill).collect()
    }

    /// Marks a bill as acknowledged by the remote.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        mark_row_synced(&self.pool, "bills", "id", id.to_owned(), Utc::now()).await
    }

    /// Records a failed push attempt for a bill.
    pub async fn record_sync_failure(
        &self,
        id: &str,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(&self.pool, "bills", "id", id.to_owned(), error, max_attempts, Utc::now())
            .await
    }

    /// Count of rows still awaiting remote acknowledgment, per table.
    ///
    /// Feeds the offline indicator in the UI.
    pub async fn pending_sync_counts(&self) -> DbResult<PendingSyncCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM order_master  WHERE sync_status != ?1) AS masters,
                (SELECT COUNT(*) FROM order_details WHERE sync_status != ?1) AS details,
                (SELECT COUNT(*) FROM bills         WHERE sync_status != ?1) AS bills,
                (SELECT COUNT(*) FROM dining_tables WHERE sync_status != ?1) AS tables,
                (SELECT COUNT(*) FROM menu_items    WHERE sync_status != ?1) AS menu_items,
                (SELECT COUNT(*) FROM modifiers     WHERE sync_status != ?1) AS modifiers
            "#,
        )
        .bind(SyncStatus::Synced)
        .fetch_one(&self.pool)
        .await?;

        Ok(PendingSyncCounts {
            order_masters: row.try_get("masters")?,
            order_details: row.try_get("details")?,
            bills: row.try_get("bills")?,
            tables: row.try_get("tables")?,
            menu_items: row.try_get("menu_items")?,
            modifiers: row.try_get("modifiers")?,
        })
    }
}

/// Unsynced row counts across all synchronized tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingSyncCounts {
    pub order_masters: i64,
    pub order_details: i64,
    pub bills: i64,
    pub tables: i64,
    pub menu_items: i64,
    pub modifiers: i64,
}

impl PendingSyncCounts {
    /// Total rows awaiting sync.
    pub fn total(&self) -> i64 {
        self.order_masters
            + self.order_details
            + self.bills
            + self.tables
            + self.menu_items
            + self.modifiers
    }
}

fn row_to_bill(row: &SqliteRow) -> DbResult<Bill> {
    Ok(Bill {
        id: row.try_get("id")?,
        bill_no: row.try_get("bill_no")?,
        order_master_id: row.try_get("order_master_id")?,
        counter_id: row.try_get("counter_id")?,
        order_amt: decimal_col(row, "order_amt")?,
        tax_amt: decimal_col(row, "tax_amt")?,
        cess: decimal_col(row, "cess")?,
        grand_total: decimal_col(row, "grand_total")?,
        rounded_amt: decimal_col(row, "rounded_amt")?,
        cash: decimal_col(row, "cash")?,
        card: decimal_col(row, "card")?,
        upi: decimal_col(row, "upi")?,
        due: decimal_col(row, "due")?,
        others: decimal_col(row, "others")?,
        received_amt: decimal_col(row, "received_amt")?,
        pending_amt: decimal_col(row, "pending_amt")?,
        customer_name: row.try_get("customer_name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        sync: sync_meta_col(row)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
