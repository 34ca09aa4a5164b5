//! # Order Repository
//!
//! Order headers and line items. The write paths are transactional: a new
//! order commits its header, its first KOT batch of lines and the table
//! occupancy flip together, or not at all.
//!
//! Lines are never physically deleted; cancellation flips `is_flag` and
//! flagged lines drop out of the billing queries.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{
    decimal_bind, decimal_col, mark_row_synced, record_row_sync_failure, sync_meta_col,
};
use dhaba_core::{Channel, OrderDetail, OrderMaster, OrderStatus, PrepareStatus, SyncStatus, TableStatus};

/// Repository for order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order header by its remote-allocated id.
    pub async fn get_master(&self, order_master_id: i64) -> DbResult<Option<OrderMaster>> {
        let row = sqlx::query("SELECT * FROM order_master WHERE order_master_id = ?1")
            .bind(order_master_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_master(&r)).transpose()
    }

    /// Finds the open order on a table, if any.
    ///
    /// At most one exists; the running-per-table unique index enforces it.
    pub async fn find_running_by_table(&self, table_id: &str) -> DbResult<Option<OrderMaster>> {
        let row = sqlx::query(
            "SELECT * FROM order_master WHERE table_id = ?1 AND status = ?2",
        )
        .bind(table_id)
        .bind(OrderStatus::Running)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_master(&r)).transpose()
    }

    /// Gets one order line by id.
    pub async fn get_detail(&self, detail_id: &str) -> DbResult<Option<OrderDetail>> {
        let row = sqlx::query("SELECT * FROM order_details WHERE id = ?1")
            .bind(detail_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_detail).transpose()
    }

    /// Lists all lines of an order, flagged ones included, in creation order.
    pub async fn list_details(&self, order_master_id: i64) -> DbResult<Vec<OrderDetail>> {
        let rows = sqlx::query(
            "SELECT * FROM order_details WHERE order_master_id = ?1 ORDER BY created_at, id",
        )
        .bind(order_master_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_detail).collect()
    }

    /// Lists the billable (unflagged) lines of an order, in creation order.
    pub async fn list_open_details(&self, order_master_id: i64) -> DbResult<Vec<OrderDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM order_details
            WHERE order_master_id = ?1 AND is_flag = 0
            ORDER BY created_at, id
            "#,
        )
        .bind(order_master_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_detail).collect()
    }

    /// Highest KOT number already used on an order, if any line exists.
    pub async fn max_kot_number(&self, order_master_id: i64) -> DbResult<Option<i64>> {
        let row = sqlx::query(
            "SELECT MAX(kot_number) AS max_kot FROM order_details WHERE order_master_id = ?1",
        )
        .bind(order_master_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("max_kot")?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a new order with its first batch of lines.
    ///
    /// Single transaction: header insert, line inserts and (for dine-in)
    /// the table occupancy flip commit together. A concurrent open order
    /// on the same table surfaces as [`DbError::UniqueViolation`].
    pub async fn create_order(
        &self,
        master: &OrderMaster,
        details: &[OrderDetail],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO order_master (
                order_master_id, channel, table_id, staff_id, status,
                created_at, completed_at,
                sync_status, sync_attempts, sync_error, last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, 0, NULL, ?8)
            "#,
        )
        .bind(master.order_master_id)
        .bind(master.channel.as_str())
        .bind(&master.table_id)
        .bind(&master.staff_id)
        .bind(master.status)
        .bind(master.created_at)
        .bind(master.sync.sync_status)
        .bind(master.sync.last_modified)
        .execute(&mut *tx)
        .await?;

        for detail in details {
            insert_detail(&mut tx, detail).await?;
        }

        if let Some(table_id) = &master.table_id {
            occupy_table(&mut tx, table_id, TableStatus::Occupied).await?;
        }

        tx.commit().await?;

        info!(
            order_id = master.order_master_id,
            channel = master.channel.as_str(),
            lines = details.len(),
            "Order created"
        );
        Ok(())
    }

    /// Appends a later KOT batch of lines to an existing running order.
    pub async fn append_details(
        &self,
        order_master_id: i64,
        details: &[OrderDetail],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> = sqlx::query(
            "SELECT status FROM order_master WHERE order_master_id = ?1",
        )
        .bind(order_master_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.try_get("status"))
        .transpose()?;

        match status.as_deref() {
            Some("running") => {}
            Some(_) | None => {
                return Err(DbError::not_found("RunningOrder", order_master_id.to_string()))
            }
        }

        for detail in details {
            insert_detail(&mut tx, detail).await?;
        }

        // Appending re-opens the header's sync window.
        sqlx::query(
            r#"
            UPDATE order_master SET sync_status = ?2, sync_attempts = 0, last_modified = ?3
            WHERE order_master_id = ?1 AND sync_status = ?4
            "#,
        )
        .bind(order_master_id)
        .bind(SyncStatus::PendingUpdate)
        .bind(Utc::now())
        .bind(SyncStatus::Synced)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id = order_master_id, lines = details.len(), "Order lines appended");
        Ok(())
    }

    /// Flags one line as cancelled. The row stays for audit and sync.
    pub async fn cancel_detail(&self, detail_id: &str) -> DbResult<()> {
        debug!(detail_id = %detail_id, "Flagging order line");

        let result = sqlx::query(
            r#"
            UPDATE order_details SET
                is_flag = 1, sync_status = ?2, sync_attempts = 0, last_modified = ?3
            WHERE id = ?1 AND is_flag = 0
            "#,
        )
        .bind(detail_id)
        .bind(SyncStatus::PendingUpdate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OrderDetail", detail_id));
        }

        Ok(())
    }

    /// Marks every pending line of a KOT batch as ready.
    pub async fn mark_kot_ready(&self, order_master_id: i64, kot_number: i64) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE order_details SET
                prepare_status = ?3, sync_status = ?4, sync_attempts = 0, last_modified = ?5
            WHERE order_master_id = ?1 AND kot_number = ?2 AND prepare_status = ?6
            "#,
        )
        .bind(order_master_id)
        .bind(kot_number)
        .bind(PrepareStatus::Ready)
        .bind(SyncStatus::PendingUpdate)
        .bind(Utc::now())
        .bind(PrepareStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Cancels a running order: flags every open line, closes the header
    /// and releases the table, in one transaction.
    pub async fn cancel_order(&self, order_master_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let master = sqlx::query("SELECT * FROM order_master WHERE order_master_id = ?1")
            .bind(order_master_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(|r| row_to_master(&r))
            .transpose()?
            .ok_or_else(|| DbError::not_found("OrderMaster", order_master_id.to_string()))?;

        if master.status != OrderStatus::Running {
            return Err(DbError::not_found("RunningOrder", order_master_id.to_string()));
        }

        sqlx::query(
            r#"
            UPDATE order_details SET
                is_flag = 1, sync_status = ?2, sync_attempts = 0, last_modified = ?3
            WHERE order_master_id = ?1 AND is_flag = 0
            "#,
        )
        .bind(order_master_id)
        .bind(SyncStatus::PendingUpdate)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE order_master SET
                status = ?2, completed_at = ?3,
                sync_status = ?4, sync_attempts = 0, last_modified = ?3
            WHERE order_master_id = ?1
            "#,
        )
        .bind(order_master_id)
        .bind(OrderStatus::Cancelled)
        .bind(now)
        .bind(SyncStatus::PendingUpdate)
        .execute(&mut *tx)
        .await?;

        if let Some(table_id) = &master.table_id {
            occupy_table(&mut tx, table_id, TableStatus::Available).await?;
        }

        tx.commit().await?;

        info!(order_id = order_master_id, "Order cancelled");
        Ok(())
    }

    // =========================================================================
    // Sync bookkeeping
    // =========================================================================

    /// Lists order headers awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_masters(&self, limit: u32) -> DbResult<Vec<OrderMaster>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM order_master
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_master).collect()
    }

    /// Lists order lines awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_details(&self, limit: u32) -> DbResult<Vec<OrderDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM order_details
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_detail).collect()
    }

    /// Marks an order header as acknowledged by the remote.
    pub async fn mark_master_synced(&self, order_master_id: i64) -> DbResult<()> {
        mark_row_synced(&self.pool, "order_master", "order_master_id", order_master_id, Utc::now())
            .await
    }

    /// Records a failed push attempt for an order header.
    pub async fn record_master_sync_failure(
        &self,
        order_master_id: i64,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(
            &self.pool,
            "order_master",
            "order_master_id",
            order_master_id,
            error,
            max_attempts,
            Utc::now(),
        )
        .await
    }

    /// Marks an order line as acknowledged by the remote.
    pub async fn mark_detail_synced(&self, detail_id: &str) -> DbResult<()> {
        mark_row_synced(&self.pool, "order_details", "id", detail_id.to_owned(), Utc::now()).await
    }

    /// Records a failed push attempt for an order line.
    pub async fn record_detail_sync_failure(
        &self,
        detail_id: &str,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(
            &self.pool,
            "order_details",
            "id",
            detail_id.to_owned(),
            error,
            max_attempts,
            Utc::now(),
        )
        .await
    }
}

// =============================================================================
// Transaction helpers (shared with the bill repository)
// =============================================================================

pub(crate) async fn insert_detail(
    tx: &mut Transaction<'_, Sqlite>,
    detail: &OrderDetail,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_details (
            id, order_master_id, menu_item_id, item_name, kitchen_cat_name,
            kot_number, qty, rate, actual_rate, parcel_charge,
            tax_id, gst_per, tax_amount,
            cgst_per, sgst_per, cgst, sgst, igst_per, igst,
            cess_per, cess, cess_specific, grand_total,
            prepare_status, is_flag, created_at,
            sync_status, sync_attempts, sync_error, last_modified
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23,
            ?24, ?25, ?26, ?27, 0, NULL, ?28
        )
        "#,
    )
    .bind(&detail.id)
    .bind(detail.order_master_id)
    .bind(&detail.menu_item_id)
    .bind(&detail.item_name)
    .bind(&detail.kitchen_cat_name)
    .bind(detail.kot_number)
    .bind(detail.qty)
    .bind(decimal_bind(detail.rate))
    .bind(decimal_bind(detail.actual_rate))
    .bind(decimal_bind(detail.parcel_charge))
    .bind(detail.tax_id)
    .bind(decimal_bind(detail.gst_per))
    .bind(decimal_bind(detail.tax_amount))
    .bind(decimal_bind(detail.cgst_per))
    .bind(decimal_bind(detail.sgst_per))
    .bind(decimal_bind(detail.cgst))
    .bind(decimal_bind(detail.sgst))
    .bind(decimal_bind(detail.igst_per))
    .bind(decimal_bind(detail.igst))
    .bind(decimal_bind(detail.cess_per))
    .bind(decimal_bind(detail.cess))
    .bind(decimal_bind(detail.cess_specific))
    .bind(decimal_bind(detail.grand_total))
    .bind(detail.prepare_status)
    .bind(detail.is_flag)
    .bind(detail.created_at)
    .bind(detail.sync.sync_status)
    .bind(detail.sync.last_modified)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) async fn occupy_table(
    tx: &mut Transaction<'_, Sqlite>,
    table_id: &str,
    status: TableStatus,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE dining_tables SET
            status = ?2, sync_status = ?3, sync_attempts = 0, last_modified = ?4
        WHERE id = ?1
        "#,
    )
    .bind(table_id)
    .bind(status)
    .bind(SyncStatus::PendingUpdate)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Table", table_id));
    }

    Ok(())
}

pub(crate) fn row_to_master(row: &SqliteRow) -> DbResult<OrderMaster> {
    let channel: String = row.try_get("channel")?;
    Ok(OrderMaster {
        order_master_id: row.try_get("order_master_id")?,
        channel: Channel::from_storage(&channel),
        table_id: row.try_get("table_id")?,
        staff_id: row.try_get("staff_id")?,
        status: row.try_get("status")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        completed_at: row.try_get("completed_at")?,
        sync: sync_meta_col(row)?,
    })
}

fn row_to_detail(row: &SqliteRow) -> DbResult<OrderDetail> {
    Ok(OrderDetail {
        id: row.try_get("id")?,
        order_master_id: row.try_get("order_master_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        item_name: row.try_get("item_name")?,
        kitchen_cat_name: row.try_get("kitchen_cat_name")?,
        kot_number: row.try_get("kot_number")?,
        qty: row.try_get("qty")?,
        rate: decimal_col(row, "rate")?,
        actual_rate: decimal_col(row, "actual_rate")?,
        parcel_charge: decimal_col(row, "parcel_charge")?,
        tax_id: row.try_get("tax_id")?,
        gst_per: decimal_col(row, "gst_per")?,
        tax_amount: decimal_col(row, "tax_amount")?,
        cgst_per: decimal_col(row, "cgst_per")?,
        sgst_per: decimal_col(row, "sgst_per")?,
        cgst: decimal_col(row, "cgst")?,
        sgst: decimal_col(row, "sgst")?,
        igst_per: decimal_col(row, "igst_per")?,
        igst: decimal_col(row, "igst")?,
        cess_per: decimal_col(row, "cess_per")?,
        cess: decimal_col(row, "cess")?,
        cess_specific: decimal_col(row, "cess_specific")?,
        grand_total: decimal_col(row, "grand_total")?,
        prepare_status: row.try_get("prepare_status")?,
        is_flag: row.try_get("is_flag")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        sync: sync_meta_col(row)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use dhaba_core::{DiningTable, SyncMeta};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.tables()
            .upsert_from_remote(&DiningTable {
                id: "t1".to_string(),
                name: "Table 1".to_string(),
                status: dhaba_core::TableStatus::Available,
                sync: SyncMeta::synced(Utc::now()),
            })
            .await
            .unwrap();
        db
    }

    fn master(id: i64, table: Option<&str>) -> OrderMaster {
        let channel = if table.is_some() {
            Channel::DineIn { ac: false }
        } else {
            Channel::TakeAway
        };
        OrderMaster {
            order_master_id: id,
            channel,
            table_id: table.map(str::to_string),
            staff_id: "staff-1".to_string(),
            status: OrderStatus::Running,
            created_at: Utc::now(),
            completed_at: None,
            sync: SyncMeta::pending_sync(Utc::now()),
        }
    }

    fn detail(order_id: i64, id: &str, kot: i64) -> OrderDetail {
        OrderDetail {
            id: id.to_string(),
            order_master_id: order_id,
            menu_item_id: "m1".to_string(),
            item_name: "Paneer Tikka".to_string(),
            kitchen_cat_name: "Tandoor".to_string(),
            kot_number: kot,
            qty: 2,
            rate: dec("84.75"),
            actual_rate: dec("100"),
            parcel_charge: Decimal::ZERO,
            tax_id: 1,
            gst_per: dec("18"),
            tax_amount: dec("30.50"),
            cgst_per: dec("9"),
            sgst_per: dec("9"),
            cgst: dec("7.63"),
            sgst: dec("7.63"),
            igst_per: Decimal::ZERO,
            igst: Decimal::ZERO,
            cess_per: Decimal::ZERO,
            cess: Decimal::ZERO,
            cess_specific: Decimal::ZERO,
            grand_total: dec("200.00"),
            prepare_status: PrepareStatus::Pending,
            is_flag: false,
            created_at: Utc::now(),
            sync: SyncMeta::pending_sync(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_create_order_occupies_table() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(1001, Some("t1")), &[detail(1001, "d1", 1)])
            .await
            .unwrap();

        let found = repo.find_running_by_table("t1").await.unwrap().unwrap();
        assert_eq!(found.order_master_id, 1001);

        let table = db.tables().get("t1").await.unwrap().unwrap();
        assert_eq!(table.status, dhaba_core::TableStatus::Occupied);

        let lines = repo.list_open_details(1001).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].grand_total, dec("200.00"));
        assert_eq!(repo.max_kot_number(1001).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_second_running_order_on_table_rejected() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(1001, Some("t1")), &[detail(1001, "d1", 1)])
            .await
            .unwrap();

        let err = repo
            .create_order(&master(1002, Some("t1")), &[detail(1002, "d2", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Nothing from the failed attempt leaked through.
        assert!(repo.get_master(1002).await.unwrap().is_none());
        assert!(repo.list_details(1002).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_details_requires_running_order() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(1001, Some("t1")), &[detail(1001, "d1", 1)])
            .await
            .unwrap();
        repo.append_details(1001, &[detail(1001, "d2", 2)]).await.unwrap();

        assert_eq!(repo.list_open_details(1001).await.unwrap().len(), 2);
        assert_eq!(repo.max_kot_number(1001).await.unwrap(), Some(2));

        let err = repo.append_details(9999, &[detail(9999, "d3", 1)]).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_detail_excludes_from_billing() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(
            &master(1001, Some("t1")),
            &[detail(1001, "d1", 1), detail(1001, "d2", 1)],
        )
        .await
        .unwrap();

        repo.cancel_detail("d1").await.unwrap();

        assert_eq!(repo.list_open_details(1001).await.unwrap().len(), 1);
        // Row survives for audit.
        assert_eq!(repo.list_details(1001).await.unwrap().len(), 2);

        // Re-cancelling the same line is an error.
        assert!(repo.cancel_detail("d1").await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_order_releases_table() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(1001, Some("t1")), &[detail(1001, "d1", 1)])
            .await
            .unwrap();
        repo.cancel_order(1001).await.unwrap();

        let loaded = repo.get_master(1001).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Cancelled);
        assert!(loaded.completed_at.is_some());

        let table = db.tables().get("t1").await.unwrap().unwrap();
        assert_eq!(table.status, dhaba_core::TableStatus::Available);

        assert!(repo.find_running_by_table("t1").await.unwrap().is_none());
        assert!(repo.list_open_details(1001).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_kot_ready() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(2001, None), &[detail(2001, "d1", 1), detail(2001, "d2", 1)])
            .await
            .unwrap();

        let updated = repo.mark_kot_ready(2001, 1).await.unwrap();
        assert_eq!(updated, 2);
        // Idempotent: already-ready lines are not touched again.
        assert_eq!(repo.mark_kot_ready(2001, 1).await.unwrap(), 0);

        let lines = repo.list_details(2001).await.unwrap();
        assert!(lines.iter().all(|l| l.prepare_status == PrepareStatus::Ready));
    }

    #[tokio::test]
    async fn test_parcel_charge_survives_round_trip() {
        let db = db().await;
        let repo = db.orders();

        let mut d1 = detail(2001, "d1", 1);
        d1.parcel_charge = dec("5");
        repo.create_order(&master(2001, None), &[d1]).await.unwrap();

        let loaded = repo.get_detail("d1").await.unwrap().unwrap();
        assert_eq!(loaded.parcel_charge, dec("5"));
        assert!(repo.get_detail("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_listings() {
        let db = db().await;
        let repo = db.orders();

        repo.create_order(&master(2001, None), &[detail(2001, "d1", 1)])
            .await
            .unwrap();

        assert_eq!(repo.list_pending_masters(10).await.unwrap().len(), 1);
        assert_eq!(repo.list_pending_details(10).await.unwrap().len(), 1);

        repo.mark_master_synced(2001).await.unwrap();
        repo.mark_detail_synced("d1").await.unwrap();

        assert!(repo.list_pending_masters(10).await.unwrap().is_empty());
        assert!(repo.list_pending_details(10).await.unwrap().is_empty());

        // Appending re-opens the header's sync window.
        repo.append_details(2001, &[detail(2001, "d2", 2)]).await.unwrap();
        let masters = repo.list_pending_masters(10).await.unwrap();
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].sync.sync_status, SyncStatus::PendingUpdate);
    }
}
