//! # Dining Table Repository
//!
//! Table directory and occupancy transitions. A table flips to
//! `occupied` when the first dine-in order opens on it and back to
//! `available` when the bill closes the order.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{mark_row_synced, record_row_sync_failure, sync_meta_col};
use dhaba_core::{DiningTable, SyncStatus, TableStatus};

const TABLE: &str = "dining_tables";
const PK: &str = "id";

/// Repository for dining table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Gets a table by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<DiningTable>> {
        let row = sqlx::query("SELECT * FROM dining_tables WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_table(&r)).transpose()
    }

    /// Lists all tables, by name.
    pub async fn list(&self) -> DbResult<Vec<DiningTable>> {
        let rows = sqlx::query("SELECT * FROM dining_tables ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_table).collect()
    }

    /// Upserts a table hydrated from the remote system of record.
    ///
    /// Hydration never clobbers a pending local edit: a row that is not
    /// currently `synced` is left untouched.
    pub async fn upsert_from_remote(&self, table: &DiningTable) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dining_tables (
                id, name, status,
                sync_status, sync_attempts, sync_error, created_at, last_modified
            ) VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                sync_status = excluded.sync_status,
                sync_attempts = 0,
                sync_error = NULL,
                last_modified = excluded.last_modified
            WHERE dining_tables.sync_status = ?6
            "#,
        )
        .bind(&table.id)
        .bind(&table.name)
        .bind(table.status)
        .bind(SyncStatus::Synced)
        .bind(Utc::now())
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a table's occupancy status and tags the row for sync.
    pub async fn set_status(&self, id: &str, status: TableStatus) -> DbResult<()> {
        debug!(table_id = %id, ?status, "Updating table status");

        let result = sqlx::query(
            r#"
            UPDATE dining_tables SET
                status = ?2,
                sync_status = ?3,
                sync_attempts = 0,
                last_modified = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(SyncStatus::PendingUpdate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
    }

    /// Lists rows awaiting remote acknowledgment, oldest first.
    pub async fn list_pending_sync(&self, limit: u32) -> DbResult<Vec<DiningTable>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM dining_tables
            WHERE sync_status != ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(SyncStatus::Synced)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_table).collect()
    }

    /// Marks a row as acknowledged by the remote.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        mark_row_synced(&self.pool, TABLE, PK, id.to_owned(), Utc::now()).await
    }

    /// Records a failed push attempt for a row.
    pub async fn record_sync_failure(
        &self,
        id: &str,
        error: &str,
        max_attempts: i64,
    ) -> DbResult<()> {
        record_row_sync_failure(&self.pool, TABLE, PK, id.to_owned(), error, max_attempts, Utc::now()).await
    }
}

fn row_to_table(row: &SqliteRow) -> DbResult<DiningTable> {
    Ok(DiningTable {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        status: row.try_get("status")?,
        sync: sync_meta_col(row)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
