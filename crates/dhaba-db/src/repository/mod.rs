//! # Repository Implementations
//!
//! One repository per aggregate: dining tables, menu catalog, orders,
//! bills. All model conversion between domain types and the storage
//! schema happens here, at the boundary — monetary columns are TEXT in
//! SQLite and `rust_decimal::Decimal` everywhere else.

pub mod bill;
pub mod menu;
pub mod order;
pub mod table;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::{DbError, DbResult};
use dhaba_core::{SyncMeta, SyncStatus};

// =============================================================================
// Column Conversion Helpers
// =============================================================================

/// Reads a TEXT money/percentage column as a Decimal.
pub(crate) fn decimal_col(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| DbError::corrupt(column, e.to_string()))?;
    Decimal::from_str(&raw).map_err(|e| DbError::corrupt(column, e.to_string()))
}

/// Render a Decimal for a TEXT column bind.
pub(crate) fn decimal_bind(value: Decimal) -> String {
    value.to_string()
}

/// Reads the uniform sync columns into a `SyncMeta`.
pub(crate) fn sync_meta_col(row: &SqliteRow) -> DbResult<SyncMeta> {
    Ok(SyncMeta {
        sync_status: row.try_get("sync_status")?,
        sync_attempts: row.try_get("sync_attempts")?,
        sync_error: row.try_get("sync_error")?,
        last_modified: row.try_get("last_modified")?,
    })
}

// =============================================================================
// Shared Sync-Column Updates
// =============================================================================
//
// The UPDATE statements for sync bookkeeping differ only by table and
// primary-key column, so they are built once here and reused by every
// repository. Table/pk names are compile-time constants from this crate,
// never user input.

/// Marks a row as acknowledged by the remote system.
pub(crate) async fn mark_row_synced<PK>(
    pool: &SqlitePool,
    table: &'static str,
    pk_col: &'static str,
    pk: PK,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    PK: for<'q> sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send,
{
    let sql = format!(
        "UPDATE {table} SET sync_status = ?1, sync_attempts = 0, sync_error = NULL, \
             last_modified = ?2 \
         WHERE {pk_col} = ?3"
    );
    sqlx::query(&sql)
        .bind(SyncStatus::Synced)
        .bind(now)
        .bind(pk)
        .execute(pool)
        .await?;
    Ok(())
}

/// Records a failed push attempt. The row flips to `sync_failed` once the
/// attempt budget is exhausted but remains eligible for later passes.
pub(crate) async fn record_row_sync_failure<PK>(
    pool: &SqlitePool,
    table: &'static str,
    pk_col: &'static str,
    pk: PK,
    error: &str,
    max_attempts: i64,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    PK: for<'q> sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send,
{
    let sql = format!(
        "UPDATE {table} SET \
             sync_attempts = sync_attempts + 1, \
             sync_error = ?1, \
             last_modified = ?2, \
             sync_status = CASE \
                 WHEN sync_attempts + 1 >= ?3 THEN ?4 \
                 ELSE sync_status \
             END \
         WHERE {pk_col} = ?5"
    );
    sqlx::query(&sql)
        .bind(error)
        .bind(now)
        .bind(max_attempts)
        .bind(SyncStatus::SyncFailed)
        .bind(pk)
        .execute(pool)
        .await?;
    Ok(())
}
