//! # Channel Pricing
//!
//! Applies channel routing and the rounding policy on top of the tax
//! decomposition engine to produce the stored monetary columns of one
//! order line.
//!
//! ## Routing rules
//! - Delivery attributes the full GST rate to a single IGST component;
//!   CGST/SGST are forced to zero and the tax split is not consulted.
//! - Dine-in and takeaway split the rate into CGST + SGST from the item's
//!   [`TaxSplit`]; IGST is zero.
//! - Takeaway and delivery lines snapshot the item's flat per-unit
//!   `parcel_charge`; it is untaxed and stays outside the line grand
//!   total and the bill aggregation.
//! - Inventory-tracked items go through the cess-aware decomposition;
//!   all other items use the plain GST decomposition. A percentage cess
//!   configured on a non-inventory item is therefore ignored — this
//!   mirrors the billing flow in production and is pinned by a test.
//!
//! ## Rounding convention
//! Decomposition runs on the *unit* channel price and each per-unit
//! component is rounded first; line values are the rounded unit values
//! multiplied by the quantity. `grand_total` is re-rounded for safety but
//! always equals `rate*qty + tax_amount + cess + cess_specific*qty`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::{Precision, HUNDRED};
use crate::tax::{decompose_gst, decompose_gst_and_cess};
use crate::types::{Channel, MenuItem, TaxSplit};
use crate::validation::validate_quantity;

// =============================================================================
// Priced Line
// =============================================================================

/// The computed monetary columns for one order line.
///
/// Everything here is already rounded to the tenant precision and ready to
/// persist on an `OrderDetail` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub tax_id: i64,
    /// Per-unit base price after tax extraction.
    pub rate: Decimal,
    /// Channel unit price before extraction.
    pub actual_rate: Decimal,
    /// Per-unit packing charge, recorded for parcel channels only.
    /// Untaxed and excluded from `grand_total`.
    pub parcel_charge: Decimal,
    pub gst_per: Decimal,
    /// Line GST amount (rounded per-unit GST × qty).
    pub tax_amount: Decimal,
    pub cgst_per: Decimal,
    pub sgst_per: Decimal,
    /// Per-unit CGST amount.
    pub cgst: Decimal,
    /// Per-unit SGST amount.
    pub sgst: Decimal,
    pub igst_per: Decimal,
    /// Per-unit IGST amount.
    pub igst: Decimal,
    pub cess_per: Decimal,
    /// Line percentage-cess amount.
    pub cess: Decimal,
    /// Flat per-unit cess addend.
    pub cess_specific: Decimal,
    /// Line payable total.
    pub grand_total: Decimal,
}

/// Prices one order line for a channel.
///
/// Selects the channel price tier, routes the GST rate (IGST vs
/// CGST/SGST), decomposes taxes per unit, rounds each component, and
/// scales to the quantity.
///
/// ## Errors
/// `ValidationError::MustBePositive` / `OutOfRange` for a non-positive or
/// oversized quantity. Quantity is validated here because this is the last
/// pure gate before numbers are persisted.
pub fn price_line(
    item: &MenuItem,
    channel: Channel,
    split: &TaxSplit,
    qty: i64,
    precision: Precision,
) -> CoreResult<PricedLine> {
    validate_quantity(qty)?;

    let unit = item.channel_rate(channel);
    let qty_d = Decimal::from(qty);

    // Channel tax routing: delivery is interstate (single IGST rate),
    // everything else splits into CGST + SGST.
    let (cgst_per, sgst_per, igst_per) = if channel.is_interstate() {
        (Decimal::ZERO, Decimal::ZERO, item.gst_per)
    } else {
        (split.cgst_per, split.sgst_per, Decimal::ZERO)
    };

    let (base, gst, cess_unit) = if item.is_inventory {
        let b = decompose_gst_and_cess(
            unit,
            item.gst_per,
            item.cess_per,
            item.is_gst_inclusive,
            item.cess_specific,
            cgst_per,
            sgst_per,
        );
        (b.base_price, b.gst_amount, b.cess_amount)
    } else {
        let b = decompose_gst(unit, item.gst_per, item.is_gst_inclusive, cgst_per, sgst_per);
        (b.base_price, b.gst_amount, Decimal::ZERO)
    };

    // Round per unit first; line values are rounded-unit × qty.
    let rate = precision.round(base);
    let unit_gst = precision.round(gst);
    let unit_cess = precision.round(cess_unit);
    let (cgst, sgst, igst) = if channel.is_interstate() {
        (Decimal::ZERO, Decimal::ZERO, unit_gst)
    } else {
        (
            precision.round(base * cgst_per / HUNDRED),
            precision.round(base * sgst_per / HUNDRED),
            Decimal::ZERO,
        )
    };

    let cess_specific = if item.is_inventory {
        item.cess_specific
    } else {
        Decimal::ZERO
    };
    let parcel_charge = if channel.is_parcel() {
        item.parcel_charge
    } else {
        Decimal::ZERO
    };

    let tax_amount = unit_gst * qty_d;
    let cess = unit_cess * qty_d;
    let grand_total = precision.round(rate * qty_d + tax_amount + cess + cess_specific * qty_d);

    Ok(PricedLine {
        tax_id: item.tax_id,
        rate,
        actual_rate: unit,
        parcel_charge,
        gst_per: item.gst_per,
        tax_amount,
        cgst_per,
        sgst_per,
        cgst,
        sgst,
        igst_per,
        igst,
        cess_per: item.cess_per,
        cess,
        cess_specific,
        grand_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
