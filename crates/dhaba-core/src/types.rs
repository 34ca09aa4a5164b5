//! # Domain Types
//!
//! Core domain types for the order-and-billing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  OrderMaster ──< OrderDetail          one open order per table      │
//! │       │                               holds priced, taxed lines     │
//! │       └──── Bill                      produced once at checkout     │
//! │                                                                     │
//! │  MenuItem (4 price tiers)   TaxSplit (cgst%/sgst% per tax id)       │
//! │  DiningTable                KitchenStation (category → printer)     │
//! │                                                                     │
//! │  Every locally-owned, remotely-mirrored row carries a SyncMeta.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity conventions
//! - Remote-allocated numeric ids (`order_master_id`, `kot_number`,
//!   `bill_no`) are `i64` and are never fabricated locally.
//! - Locally-created rows (OrderDetail, Bill row) use UUID v4 string ids.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Channel
// =============================================================================

/// Fulfillment channel of an order.
///
/// The channel decides the menu price tier and the tax routing: delivery
/// attributes the whole GST rate to IGST, every other channel splits it
/// into CGST + SGST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Channel {
    /// On-premise dining; `ac` selects the air-conditioned price tier.
    DineIn { ac: bool },
    /// Counter takeaway (parcel pricing).
    TakeAway,
    /// Delivery (parcel pricing, interstate IGST routing).
    Delivery,
}

impl Channel {
    /// Parses the channel string sent by the UI.
    ///
    /// `"AC"`, `"PARCEL"`, `"TAKEAWAY"`, `"DELIVERY"` are recognized;
    /// anything else defaults to non-AC dine-in.
    pub fn parse(s: &str) -> Channel {
        match s.trim().to_ascii_uppercase().as_str() {
            "AC" => Channel::DineIn { ac: true },
            "PARCEL" | "TAKEAWAY" => Channel::TakeAway,
            "DELIVERY" => Channel::Delivery,
            _ => Channel::DineIn { ac: false },
        }
    }

    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::DineIn { ac: false } => "dine_in",
            Channel::DineIn { ac: true } => "dine_in_ac",
            Channel::TakeAway => "take_away",
            Channel::Delivery => "delivery",
        }
    }

    /// Inverse of [`Channel::as_str`]. Unknown input maps to non-AC dine-in,
    /// mirroring [`Channel::parse`].
    pub fn from_storage(s: &str) -> Channel {
        match s {
            "dine_in_ac" => Channel::DineIn { ac: true },
            "take_away" => Channel::TakeAway,
            "delivery" => Channel::Delivery,
            _ => Channel::DineIn { ac: false },
        }
    }

    /// Whether the order occupies a physical table.
    #[inline]
    pub fn is_dine_in(&self) -> bool {
        matches!(self, Channel::DineIn { .. })
    }

    /// Whether the order leaves on parcel pricing (takeaway or delivery).
    #[inline]
    pub fn is_parcel(&self) -> bool {
        matches!(self, Channel::TakeAway | Channel::Delivery)
    }

    /// Whether the full GST rate routes to a single IGST component.
    #[inline]
    pub fn is_interstate(&self) -> bool {
        matches!(self, Channel::Delivery)
    }

    /// Label printed on kitchen tickets for non-table channels.
    pub fn ticket_label(&self) -> &'static str {
        match self {
            Channel::DineIn { .. } => "DINE-IN",
            Channel::TakeAway => "TAKEAWAY",
            Channel::Delivery => "DELIVERY",
        }
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Lifecycle state of an OrderMaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is open; items may still be appended.
    Running,
    /// Order was billed and closed. Terminal.
    Completed,
    /// Order was cancelled before billing. Terminal, reachable only
    /// from Running.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Running
    }
}

/// Occupancy state of a dining table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
}

/// Kitchen preparation state of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PrepareStatus {
    /// Sent to the kitchen, not yet ready.
    Pending,
    /// Ready to serve (set immediately when KOT printing is disabled).
    Ready,
}

/// Payment method a bill's grand total is allocated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    /// Credit: nothing received now, full amount pending.
    Due,
    Others,
}

// =============================================================================
// Sync Metadata
// =============================================================================

/// Synchronization state of a locally-owned, remotely-mirrored row.
///
/// Lifecycle: hydrated from remote as `Synced`; local mutation while offline
/// tags `Pending*`; a confirmed remote acknowledgment advances to `Synced`;
/// exhausted retries mark `SyncFailed` (the row stays locally usable and is
/// retried on the next connectivity window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    PendingSync,
    PendingUpdate,
    /// Local delete awaiting acknowledgment. No engine flow produces it
    /// today — lines are voided via `is_flag` and catalog rows come from
    /// the remote — but the status vocabulary is shared with the system
    /// of record, which does delete.
    PendingDelete,
    SyncFailed,
}

impl SyncStatus {
    /// Whether the row still needs a remote acknowledgment.
    #[inline]
    pub fn needs_sync(&self) -> bool {
        !matches!(self, SyncStatus::Synced)
    }
}

/// Uniform sync bookkeeping carried by every synchronized entity:
/// status, attempt count, last error, last local modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub sync_status: SyncStatus,
    pub sync_attempts: i64,
    pub sync_error: Option<String>,
    pub last_modified: DateTime<Utc>,
}

impl SyncMeta {
    /// Metadata for a row hydrated from the remote system of record.
    pub fn synced(now: DateTime<Utc>) -> Self {
        SyncMeta {
            sync_status: SyncStatus::Synced,
            sync_attempts: 0,
            sync_error: None,
            last_modified: now,
        }
    }

    /// Metadata for a locally-created row awaiting its first remote push.
    pub fn pending_sync(now: DateTime<Utc>) -> Self {
        SyncMeta {
            sync_status: SyncStatus::PendingSync,
            sync_attempts: 0,
            sync_error: None,
            last_modified: now,
        }
    }

    /// Metadata for a locally-updated, previously synced row.
    pub fn pending_update(now: DateTime<Utc>) -> Self {
        SyncMeta {
            sync_status: SyncStatus::PendingUpdate,
            sync_attempts: 0,
            sync_error: None,
            last_modified: now,
        }
    }
}

// =============================================================================
// Tables & Menu
// =============================================================================

/// A physical dining table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub name: String,
    pub status: TableStatus,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

/// A menu item with its four channel price tiers and tax configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Kitchen category; KOT batches group by this, and each category
    /// resolves to its own printer station.
    pub kitchen_cat_name: String,
    /// Dine-in, non-AC unit price.
    pub rate: Decimal,
    /// Air-conditioned dine-in unit price.
    pub ac_rate: Decimal,
    /// Takeaway/delivery unit price.
    pub parcel_rate: Decimal,
    /// Flat per-unit packing charge, copied onto takeaway/delivery lines.
    /// Untaxed and outside the line grand total.
    pub parcel_charge: Decimal,
    pub tax_id: i64,
    /// Total GST percentage for this item.
    pub gst_per: Decimal,
    /// Percentage cess (decomposed only for inventory items).
    pub cess_per: Decimal,
    /// Flat per-unit cess addend, applied after tax computation.
    pub cess_specific: Decimal,
    /// Inventory-tracked items use the cess-aware decomposition.
    pub is_inventory: bool,
    /// Whether the channel price already includes GST.
    pub is_gst_inclusive: bool,
    pub is_active: bool,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

impl MenuItem {
    /// Selects the unit price tier for the channel in effect at order time.
    pub fn channel_rate(&self, channel: Channel) -> Decimal {
        match channel {
            Channel::DineIn { ac: false } => self.rate,
            Channel::DineIn { ac: true } => self.ac_rate,
            Channel::TakeAway | Channel::Delivery => self.parcel_rate,
        }
    }
}

/// An add-on modifier (extra cheese, less spice, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub rate: Decimal,
    pub is_active: bool,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

/// Maps a kitchen category to its ticket printer address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenStation {
    pub kitchen_cat_name: String,
    /// Printer address (IP:port) for this station.
    pub printer_addr: String,
}

/// Per-tax-id CGST/SGST percentage pair summing to the item's GST rate.
///
/// Used for dine-in/takeaway; delivery routes the whole rate to IGST and
/// never consults the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub tax_id: i64,
    pub cgst_per: Decimal,
    pub sgst_per: Decimal,
}

// =============================================================================
// Orders
// =============================================================================

/// Header record for one order session: a table visit or a
/// takeaway/delivery ticket.
///
/// Invariant: at most one OrderMaster with `status = Running` per table
/// at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMaster {
    /// Assigned by the remote allocator, never generated locally.
    pub order_master_id: i64,
    pub channel: Channel,
    /// Required for dine-in, absent otherwise.
    pub table_id: Option<String>,
    pub staff_id: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

/// A priced, taxed line item belonging to exactly one OrderMaster.
///
/// Immutable once printed to kitchen except for the status flags;
/// cancellation toggles `is_flag`, rows are never physically deleted.
///
/// Component invariant (after rounding):
/// `grand_total = rate*qty + tax_amount + cess + cess_specific*qty`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: String,
    pub order_master_id: i64,
    pub menu_item_id: String,
    /// Name snapshot at order time; menu edits don't rewrite history.
    pub item_name: String,
    pub kitchen_cat_name: String,
    /// KOT batch this line was sent to the kitchen in.
    pub kot_number: i64,
    pub qty: i64,
    /// Per-unit base price after tax extraction, rounded.
    pub rate: Decimal,
    /// Channel unit price before tax extraction.
    pub actual_rate: Decimal,
    /// Per-unit packing charge snapshot on takeaway/delivery lines, zero
    /// for dine-in. Untaxed, outside `grand_total` and bill aggregation.
    pub parcel_charge: Decimal,
    pub tax_id: i64,
    pub gst_per: Decimal,
    /// Line GST amount (per-unit GST, rounded, × qty).
    pub tax_amount: Decimal,
    pub cgst_per: Decimal,
    pub sgst_per: Decimal,
    /// Per-unit CGST amount, rounded. Zero on delivery.
    pub cgst: Decimal,
    /// Per-unit SGST amount, rounded. Zero on delivery.
    pub sgst: Decimal,
    pub igst_per: Decimal,
    /// Per-unit IGST amount, rounded. Non-zero only on delivery.
    pub igst: Decimal,
    pub cess_per: Decimal,
    /// Line percentage-cess amount (per-unit cess, rounded, × qty).
    pub cess: Decimal,
    /// Flat per-unit cess addend, untaxed.
    pub cess_specific: Decimal,
    /// Line payable total, rounded.
    pub grand_total: Decimal,
    pub prepare_status: PrepareStatus,
    /// Void/cancel marker. Flagged lines are excluded from billing.
    pub is_flag: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

impl OrderDetail {
    /// Whether this line still counts toward the bill.
    #[inline]
    pub fn is_open(&self) -> bool {
        !self.is_flag
    }
}

// =============================================================================
// Bill
// =============================================================================

/// The payable bill produced once per OrderMaster at checkout.
///
/// Immutable after creation (refund/void workflows live elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// Local row id (UUID v4).
    pub id: String,
    /// Externally allocated bill number.
    pub bill_no: i64,
    pub order_master_id: i64,
    pub counter_id: String,
    /// Sum of line base amounts (`rate * qty`).
    pub order_amt: Decimal,
    pub tax_amt: Decimal,
    pub cess: Decimal,
    pub grand_total: Decimal,
    /// Grand total after the rounding policy.
    pub rounded_amt: Decimal,
    pub cash: Decimal,
    pub card: Decimal,
    pub upi: Decimal,
    pub due: Decimal,
    pub others: Decimal,
    pub received_amt: Decimal,
    pub pending_amt: Decimal,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub sync: SyncMeta,
}

// =============================================================================
// Unit Tests
// =============================================================================
