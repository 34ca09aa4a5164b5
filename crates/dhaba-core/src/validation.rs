//! # Validation Module
//!
//! Business-rule validation run before any I/O. Validation failures are
//! rejected immediately and never partially commit anything.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (complimentary items).
pub fn validate_rate(rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: "rate".to_string(),
        });
    }

    Ok(())
}

/// Validates a GST percentage (0 inclusive to 100 exclusive).
pub fn validate_gst_rate(rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate >= Decimal::from(100) {
        return Err(ValidationError::OutOfRange {
            field: "gst_per".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a placement batch's line count.
///
/// ## Rules
/// - Must not be empty (an order without items is meaningless)
/// - Must not exceed [`MAX_ORDER_LINES`]
pub fn validate_order_lines(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
