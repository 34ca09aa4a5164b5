//! # Tax Decomposition Engine
//!
//! Pure functions converting a channel unit price into base price + tax
//! components. Two entry points: plain GST, and GST + cess for
//! inventory-tracked items.
//!
//! ## Inclusive vs Exclusive
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  INCLUSIVE (price already contains tax):                            │
//! │    base = amount / (1 + rate/100)                                   │
//! │    gst  = base * rate/100                                           │
//! │    total == amount            (round-trip property)                 │
//! │                                                                     │
//! │  EXCLUSIVE (tax added on top):                                      │
//! │    base = amount                                                    │
//! │    gst  = amount * rate/100                                         │
//! │    total = amount + gst                                             │
//! │                                                                     │
//! │  CESS: percentage cess joins the GST rate in the inclusive split;   │
//! │  the flat per-unit `cess_specific` is subtracted BEFORE the split   │
//! │  and re-added untaxed to the final total.                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Results are raw (unrounded); the rounding policy is applied per stored
//! component by the caller. Channel routing (IGST vs CGST/SGST) is also the
//! caller's concern — see [`crate::pricing`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::HUNDRED;

// =============================================================================
// Breakup Types
// =============================================================================

/// Decomposed GST components for one unit amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstBreakup {
    /// Price net of GST.
    pub base_price: Decimal,
    /// Total GST on the base price.
    pub gst_amount: Decimal,
    /// Base plus GST (equals the input amount in the inclusive case).
    pub total_price: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
}

/// Decomposed GST + cess components for one unit amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstCessBreakup {
    pub base_price: Decimal,
    pub gst_amount: Decimal,
    /// Percentage cess on the base price.
    pub cess_amount: Decimal,
    /// Base + GST + cess + the flat per-unit cess addend.
    pub total_price: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
}

// =============================================================================
// Decomposition
// =============================================================================

/// Splits a unit amount into base price and GST components.
///
/// `cgst_rate`/`sgst_rate` are the split percentages for the caller's
/// channel; a delivery caller passes zeroes and attributes `gst_amount`
/// to IGST itself.
///
/// ## Edge case
/// `gst_rate = 0` yields `base_price = amount` with all components zero.
pub fn decompose_gst(
    amount: Decimal,
    gst_rate: Decimal,
    inclusive: bool,
    cgst_rate: Decimal,
    sgst_rate: Decimal,
) -> GstBreakup {
    if inclusive {
        let base_price = amount / (Decimal::ONE + gst_rate / HUNDRED);
        let gst_amount = base_price * gst_rate / HUNDRED;
        GstBreakup {
            base_price,
            gst_amount,
            total_price: base_price + gst_amount,
            cgst: base_price * cgst_rate / HUNDRED,
            sgst: base_price * sgst_rate / HUNDRED,
        }
    } else {
        let gst_amount = amount * gst_rate / HUNDRED;
        GstBreakup {
            base_price: amount,
            gst_amount,
            total_price: amount + gst_amount,
            cgst: amount * cgst_rate / HUNDRED,
            sgst: amount * sgst_rate / HUNDRED,
        }
    }
}

/// Splits a unit amount into base price, GST and cess components.
///
/// `cess_specific` is a flat per-unit addend applied *after* tax
/// computation and is itself untaxed: in the inclusive case it is
/// subtracted from the amount before the combined `(gst + cess)` rate
/// split and re-added to the final total.
pub fn decompose_gst_and_cess(
    amount: Decimal,
    gst_rate: Decimal,
    cess_rate: Decimal,
    inclusive: bool,
    cess_specific: Decimal,
    cgst_rate: Decimal,
    sgst_rate: Decimal,
) -> GstCessBreakup {
    if inclusive {
        let taxable = amount - cess_specific;
        let combined = gst_rate + cess_rate;
        let base_price = taxable / (Decimal::ONE + combined / HUNDRED);
        let gst_amount = base_price * gst_rate / HUNDRED;
        let cess_amount = base_price * cess_rate / HUNDRED;
        GstCessBreakup {
            base_price,
            gst_amount,
            cess_amount,
            total_price: base_price + gst_amount + cess_amount + cess_specific,
            cgst: base_price * cgst_rate / HUNDRED,
            sgst: base_price * sgst_rate / HUNDRED,
        }
    } else {
        let gst_amount = amount * gst_rate / HUNDRED;
        let cess_amount = amount * cess_rate / HUNDRED;
        GstCessBreakup {
            base_price: amount,
            gst_amount,
            cess_amount,
            total_price: amount + gst_amount + cess_amount + cess_specific,
            cgst: amount * cgst_rate / HUNDRED,
            sgst: amount * sgst_rate / HUNDRED,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Acceptable residue from repeating-decimal division.
    fn assert_close(a: Decimal, b: Decimal) {
        let eps = d("0.0000001");
        assert!((a - b).abs() < eps, "{} !~ {}", a, b);
    }

    #[test]
    fn test_inclusive_gst_round_trip() {
        // Rate 100 inclusive at 18% splits to ~84.7458 + ~15.2542
        let b = decompose_gst(d("100"), d("18"), true, d("9"), d("9"));
        assert_close(b.base_price, d("84.7457627118644067796610169"));
        assert_close(b.gst_amount, b.base_price * d("0.18"));
        assert_close(b.total_price, d("100"));
        assert_close(b.cgst, b.sgst);
        assert_close(b.cgst + b.sgst, b.gst_amount);
    }

    #[test]
    fn test_inclusive_round_trip_property_over_rates() {
        for rate in ["0", "5", "12", "18", "28", "99.9"] {
            for amount in ["1", "49.50", "100", "12345.675"] {
                let half = d(rate) / Decimal::TWO;
                let b = decompose_gst(d(amount), d(rate), true, half, half);
                assert_close(b.total_price, d(amount));
            }
        }
    }

    #[test]
    fn test_exclusive_gst() {
        let b = decompose_gst(d("100"), d("18"), false, d("9"), d("9"));
        assert_eq!(b.base_price, d("100"));
        assert_eq!(b.gst_amount, d("18"));
        assert_eq!(b.total_price, d("118"));
        assert_eq!(b.cgst, d("9"));
        assert_eq!(b.sgst, d("9"));
    }

    #[test]
    fn test_zero_rate_yields_base_equals_amount() {
        let b = decompose_gst(d("250"), Decimal::ZERO, true, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(b.base_price, d("250"));
        assert_eq!(b.gst_amount, Decimal::ZERO);
        assert_eq!(b.total_price, d("250"));
    }

    #[test]
    fn test_uneven_split() {
        // 12% split 7/5 rather than 6/6
        let b = decompose_gst(d("112"), d("12"), true, d("7"), d("5"));
        assert_close(b.base_price, d("100"));
        assert_close(b.cgst, d("7"));
        assert_close(b.sgst, d("5"));
        assert_close(b.cgst + b.sgst, b.gst_amount);
    }

    #[test]
    fn test_inclusive_cess_combined_rate() {
        // Amount 100 inclusive, 18% GST + 5% cess + 2 flat.
        // Combined 23% splits the taxable remainder 98.
        let b = decompose_gst_and_cess(d("100"), d("18"), d("5"), true, d("2"), d("9"), d("9"));
        let expected_base = d("98") / d("1.23");
        assert_close(b.base_price, expected_base);
        assert_close(b.gst_amount, expected_base * d("0.18"));
        assert_close(b.cess_amount, expected_base * d("0.05"));
        // cess_specific re-added untaxed
        assert_close(b.total_price, d("100"));
    }

    #[test]
    fn test_cess_additivity() {
        for inclusive in [true, false] {
            let b =
                decompose_gst_and_cess(d("150"), d("18"), d("5"), inclusive, d("2"), d("9"), d("9"));
            assert_close(
                b.total_price,
                b.base_price + b.gst_amount + b.cess_amount + d("2"),
            );
        }
    }

    #[test]
    fn test_exclusive_cess() {
        let b = decompose_gst_and_cess(d("100"), d("18"), d("5"), false, d("2"), d("9"), d("9"));
        assert_eq!(b.base_price, d("100"));
        assert_eq!(b.gst_amount, d("18"));
        assert_eq!(b.cess_amount, d("5"));
        assert_eq!(b.total_price, d("125"));
    }
}
