//! # Money & Rounding Policy
//!
//! Every monetary value in the engine is a `rust_decimal::Decimal`, and every
//! stored monetary component goes through the tenant-configured rounding
//! policy exactly once.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Floats drift (0.1 + 0.2 != 0.3) and integer minor units fix the    │
//! │  scale at two places. A tenant here may bill at 2, 3 or 4 decimal   │
//! │  places, so the policy is data, not a type parameter.               │
//! │                                                                     │
//! │  Rounding drift must be REPRODUCIBLE: each stored component (rate,  │
//! │  tax_amount, sgst, cgst, cess, grand_total) is rounded on write.    │
//! │  Rounding only the total is not a substitute — a re-derived total   │
//! │  would disagree with the persisted components.                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Precision
// =============================================================================

/// Tenant-configured decimal precision for monetary values.
///
/// Only 2, 3 or 4 decimal places are valid; construction enforces the
/// range, deserialization included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct Precision(u32);

impl TryFrom<u32> for Precision {
    type Error = ValidationError;

    fn try_from(dp: u32) -> Result<Self, Self::Error> {
        Precision::new(dp)
    }
}

impl Precision {
    /// Two decimal places (the common case for INR billing).
    pub const TWO: Precision = Precision(2);
    /// Three decimal places.
    pub const THREE: Precision = Precision(3);
    /// Four decimal places.
    pub const FOUR: Precision = Precision(4);

    /// Creates a precision from a tenant setting.
    ///
    /// ## Errors
    /// `ValidationError::OutOfRange` when `dp` is not 2, 3 or 4.
    pub fn new(dp: u32) -> Result<Self, ValidationError> {
        if !(2..=4).contains(&dp) {
            return Err(ValidationError::OutOfRange {
                field: "precision".to_string(),
                min: 2,
                max: 4,
            });
        }
        Ok(Precision(dp))
    }

    /// Returns the number of decimal places.
    #[inline]
    pub const fn dp(&self) -> u32 {
        self.0
    }

    /// Rounds a value to this precision using half-up
    /// (round-half-away-from-zero) rounding.
    ///
    /// Idempotent: `p.round(p.round(x)) == p.round(x)`.
    ///
    /// ## Example
    /// ```rust
    /// use dhaba_core::money::Precision;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let p = Precision::TWO;
    /// let v = Decimal::from_str("84.745762").unwrap();
    /// assert_eq!(p.round(v), Decimal::from_str("84.75").unwrap());
    /// ```
    #[inline]
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.0, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::TWO
    }
}

/// Rounds a monetary value at the configured precision, half-up.
///
/// Free-function form of [`Precision::round`] for call sites that read
/// better with the policy applied explicitly.
#[inline]
pub fn round(value: Decimal, precision: Precision) -> Decimal {
    precision.round(value)
}

/// One hundred, as a Decimal. Percentage math divides by this constant.
pub(crate) const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

// =============================================================================
// Unit Tests
// =============================================================================
