//! Sync error types.
//!
//! The reconciler loop never surfaces these as hard failures to the
//! terminal: a failed push leaves the row tagged and retried later.

use thiserror::Error;

use dhaba_db::DbError;

/// Errors within the sync layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store failure.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// The remote backend rejected or could not be reached.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A row could not be serialized into a push envelope.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal channel closed unexpectedly.
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
