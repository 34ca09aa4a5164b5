//! # Engine Error Types
//!
//! The error taxonomy of the order/billing operations. Validation
//! failures are rejected before any I/O; allocation failures abort the
//! whole operation with nothing partially committed; KOT print failures
//! are deliberately *not* here — they ride inside the success payload
//! (see `kot::KotDispatchReport`).

use thiserror::Error;

use dhaba_core::{CoreError, ValidationError};
use dhaba_db::DbError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Placement called with an empty item list.
    #[error("Order has no items")]
    EmptyOrder,

    /// Input rejected before any I/O.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A remote id/number allocator was unreachable or errored.
    /// The whole placement/billing operation aborts.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A bill already exists for this order.
    #[error("Order {0} is already billed")]
    AlreadyBilled(i64),

    /// Billing found no open (unflagged) lines for the order.
    #[error("Order {0} has no open lines to bill")]
    NoOpenOrder(i64),

    /// Local store failure.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => EngineError::Validation(v),
            // A tax-split mismatch is a domain/configuration failure,
            // surfaced through the validation taxonomy (§7).
            e @ CoreError::TaxSplitMismatch { .. } => {
                EngineError::Validation(ValidationError::InvalidFormat {
                    field: "tax_split".to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
