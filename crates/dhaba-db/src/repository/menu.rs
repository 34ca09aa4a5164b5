//! # Menu Repository
//!
//! Catalog data: menu items, modifiers, kitchen printer stations and the
//! local cache of CGST/SGST tax splits. The catalog is owned by the remote
//! back office; locally it is hydrated read-mostly, with edits (price
//! changes made at the counter) tagged for push.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{
    decimal_bind, decimal_col, mark_row_synced, record_row_sync_failure, sync_meta_col,
};
use dhaba_core::{KitchenStation, MenuItem, Modifier, SyncStatus, TaxSplit};

/// Repository for menu catalog operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    // =========================================================================
    // Menu items
    // =========================================================================

    /// Gets a menu item by ID.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let row = sqlx::query("SELECT * FROM menu_items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_item(&r)).transpose()
    }

    /// Lists active menu items, by name.
    pub async fn list_active_items(&self) -> DbResult<Vec<MenuItem>> {
        let rows = sqlx::query("SELECT * FROM menu_items WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    /// Upserts a menu item hydrated from the remote catalog.
    ///
    /// Rows carrying an unpushed local edit are left untouched.
    pub async fn upsert_item_from_remote(&self, item: &MenuItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, name, kitchen_cat_name,
                rate, ac_rate, parcel_rate, parcel_charge,
                tax_id, gst_per, cess_per, cess_specific,
                is_inventory, is_gst_inclusive, is_active,
                sync_status, sync_attempts, sync_error, created_at, last_modified
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, 0, NULL, ?16, ?16
            )
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                kitchen_cat_name = excluded.kitchen_cat_name,
                rate = excluded.rate,
                ac_rate = excluded.ac_rate,
                parcel_rate = excluded.parcel_rate,
                parcel_charge = excluded.parcel_charge,
                tax_id = excluded.tax_id,
                gst_per = excluded.gst_per,
                cess_per = excluded.cess_per,
                cess_specific = excluded.cess_specific,
                is_inventory = excluded.is_inventory,
                is_gst_inclusive = excluded.is_gst_inclusive,
                is_active = excluded.is_active,
                sync_status = excluded.sync_status,
                sync_attempts = 0,
                sync_error = NULL,
                last_modified = excluded.last_modified
            WHERE menu_items.sync_status = ?17
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.kitchen_cat_name)
        .bind(decimal_bind(item.rate))
        .bind(decimal_bind(item.ac_rate))
        .bind(decimal_bind(item.parcel_rate))
        .bind(decimal_bind(item.parcel_charge))
        .bind(item.tax_id)
        .bind(decimal_bind(item.gst_per))
        .bind(decimal_bind(item.cess_per))
        .bind(decimal_bind(item.cess_specific))
        .bind(item.is_inventory)
        .bind(item.is_gst_inclusive)
        .bind(item.is_active)
        .bind(SyncStatus::Synced)
        .bind(Utc::now())
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the four channel prices of an item and tags the row for sync.
    pub async fn update_item_prices(
        &self,
        id: &str,
        rate: rust_decimal::Decimal,
        ac_rate: rust_decimal::Decimal,
        parcel_rate: rust_decimal::Decimal,
        parcel_charge: rust_decimal::Decimal,
    ) -> DbResult<()> {
        debug!(item_id = %id, "Updating menu item prices");

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                rate = ?2, ac_rate = ?3, parcel_rate = ?4, parcel_charge = ?5,
                sync_status = ?6, sync_attempts = 0, last_modified = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(decimal_bind(rate))
        .bind(decimal_bind(ac_rate))
        .bind(decimal_bind(parcel_rate))
        .bind(decimal_bind(parcel_charge))
        .bind(SyncStatus::PendingUpdate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }

    /// Lists menu item rows awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_items(&self, limit: u32) -> DbResult<Vec<MenuItem>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM menu_items
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    /// Marks a menu item row as acknowledged by the remote.
    pub async fn mark_item_synced(&self, id: &str) -> DbResult<()> {
        mark_row_synced(&self.pool, "menu_items", "id", id.to_owned(), Utc::now()).await
    }

    /// Records a failed push attempt for a menu item row.
    pub async fn record_item_sync_failure(
        &self,
        id: &str,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(&self.pool, "menu_items", "id", id.to_owned(), error, max_attempts, Utc::now())
            .await
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    /// Lists active modifiers, by name.
    pub async fn list_active_modifiers(&self) -> DbResult<Vec<Modifier>> {
        let rows = sqlx::query("SELECT * FROM modifiers WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_modifier).collect()
    }

    /// Upserts a modifier hydrated from the remote catalog.
    pub async fn upsert_modifier_from_remote(&self, modifier: &Modifier) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO modifiers (
                id, name, rate, is_active,
                sync_status, sync_attempts, sync_error, created_at, last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                rate = excluded.rate,
                is_active = excluded.is_active,
                sync_status = excluded.sync_status,
                sync_attempts = 0,
                sync_error = NULL,
                last_modified = excluded.last_modified
            WHERE modifiers.sync_status = ?7
            "#,
        )
        .bind(&modifier.id)
        .bind(&modifier.name)
        .bind(decimal_bind(modifier.rate))
        .bind(modifier.is_active)
        .bind(SyncStatus::Synced)
        .bind(Utc::now())
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists modifier rows awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_modifiers(&self, limit: u32) -> DbResult<Vec<Modifier>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM modifiers
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_modifier).collect()
    }

    /// Marks a modifier row as acknowledged by the remote.
    pub async fn mark_modifier_synced(&self, id: &str) -> DbResult<()> {
        mark_row_synced(&self.pool, "modifiers", "id", id.to_owned(), Utc::now()).await
    }

    /// Records a failed push attempt for a modifier row.
    pub async fn record_modifier_sync_failure(
        &self,
        id: &str,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(&self.pool, "modifiers", "id", id.to_owned(), error, max_attempts, Utc::now())
            .await
    }

    // =========================================================================
    // Kitchen stations
    // =========================================================================

    /// Gets the printer station for a kitchen category.
    pub async fn get_station(&self, kitchen_cat_name: &str) -> DbResult<Option<KitchenStation>> {
        let row = sqlx::query("SELECT * FROM kitchen_stations WHERE kitchen_cat_name = ?1")
            .bind(kitchen_cat_name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            Ok(KitchenStation {
                kitchen_cat_name: r.try_get("kitchen_cat_name")?,
                printer_addr: r.try_get("printer_addr")?,
            })
        })
        .transpose()
    }

    /// Replaces the printer mapping for a kitchen category.
    pub async fn upsert_station(&self, station: &KitchenStation) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kitchen_stations (kitchen_cat_name, printer_addr)
            VALUES (?1, ?2)
            ON CONFLICT(kitchen_cat_name) DO UPDATE SET
                printer_addr = excluded.printer_addr
            "#,
        )
        .bind(&station.kitchen_cat_name)
        .bind(&station.printer_addr)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Tax splits
    // =========================================================================

    /// Gets the cached CGST/SGST split for a tax id.
    pub async fn get_tax_split(&self, tax_id: i64) -> DbResult<Option<TaxSplit>> {
        let row = sqlx::query("SELECT * FROM tax_splits WHERE tax_id = ?1")
            .bind(tax_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            Ok(TaxSplit {
                tax_id: r.try_get("tax_id")?,
                cgst_per: decimal_col(&r, "cgst_per")?,
                sgst_per: decimal_col(&r, "sgst_per")?,
            })
        })
        .transpose()
    }

    /// Caches a split fetched from the remote tax master.
    pub async fn cache_tax_split(&self, split: &TaxSplit) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tax_splits (tax_id, cgst_per, sgst_per)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(tax_id) DO UPDATE SET
                cgst_per = excluded.cgst_per,
                sgst_per = excluded.sgst_per
            "#,
        )
        .bind(split.tax_id)
        .bind(decimal_bind(split.cgst_per))
        .bind(decimal_bind(split.sgst_per))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_item(row: &SqliteRow) -> DbResult<MenuItem> {
    Ok(MenuItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kitchen_cat_name: row.try_get("kitchen_cat_name")?,
        rate: decimal_col(row, "rate")?,
        ac_rate: decimal_col(row, "ac_rate")?,
        parcel_rate: decimal_col(row, "parcel_rate")?,
        parcel_charge: decimal_col(row, "parcel_charge")?,
        tax_id: row.try_get("tax_id")?,
        gst_per: decimal_col(row, "gst_per")?,
        cess_per: decimal_col(row, "cess_per")?,
        cess_specific: decimal_col(row, "cess_specific")?,
        is_inventory: row.try_get("is_inventory")?,
        is_gst_inclusive: row.try_get("is_gst_inclusive")?,
        is_active: row.try_get("is_active")?,
        sync: sync_meta_col(row)?,
    })
}

fn row_to_modifier(row: &SqliteRow) -> DbResult<Modifier> {
    Ok(Modifier {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        rate: decimal_col(row, "rate")?,
        is_active: row.try_get("is_active")?,
        sync: sync_meta_col(row)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
