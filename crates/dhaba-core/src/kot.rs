//! # KOT Batching
//!
//! Pure grouping of order lines into per-kitchen-category ticket requests.
//! Different stations (Tandoor, Chinese, Beverages, ...) have different
//! printers, so one placement batch fans out into one ticket per category.
//!
//! Dispatching the tickets (printer resolution, partial failures) lives in
//! the engine; this module only assembles the payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::OrderDetail;

// =============================================================================
// Ticket Types
// =============================================================================

/// One line on a kitchen ticket. Quantities and names only — the kitchen
/// never sees prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotItem {
    pub item_name: String,
    pub qty: i64,
}

/// A fully-formed kitchen ticket for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotRequest {
    /// KOT batch number shared by every line in this placement.
    pub kot_number: i64,
    pub order_master_id: i64,
    /// Table name for dine-in, channel label otherwise.
    pub label: String,
    pub waiter_name: String,
    pub kitchen_cat_name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<KotItem>,
}

/// Groups priced order lines by kitchen category into ticket requests.
///
/// Returns a `BTreeMap` so ticket order is deterministic by category name.
/// Flagged (voided) lines are skipped. All lines are expected to share one
/// `kot_number`/`order_master_id` — the values of the first line per
/// category are taken as the batch's.
pub fn build_kot_batches(
    details: &[OrderDetail],
    label: &str,
    waiter_name: &str,
    created_at: DateTime<Utc>,
) -> BTreeMap<String, KotRequest> {
    let mut batches: BTreeMap<String, KotRequest> = BTreeMap::new();

    for detail in details.iter().filter(|d| d.is_open()) {
        let entry = batches
            .entry(detail.kitchen_cat_name.clone())
            .or_insert_with(|| KotRequest {
                kot_number: detail.kot_number,
                order_master_id: detail.order_master_id,
                label: label.to_string(),
                waiter_name: waiter_name.to_string(),
                kitchen_cat_name: detail.kitchen_cat_name.clone(),
                created_at,
                items: Vec::new(),
            });
        entry.items.push(KotItem {
            item_name: detail.item_name.clone(),
            qty: detail.qty,
        });
    }

    batches
}

// =============================================================================
// Unit Tests
// =============================================================================
