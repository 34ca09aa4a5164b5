//! Per-terminal session configuration consumed by the engine.

use dhaba_core::Precision;
use serde::{Deserialize, Serialize};

/// Identity and policy of the terminal driving the engine: which tenant
/// and counter the remote allocators bill against, who is operating, how
/// money is rounded, and whether kitchen tickets are produced at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Tenant code for all remote calls.
    pub tenant: String,
    /// Active billing counter id.
    pub counter_id: String,
    /// Operator (waiter/cashier) recorded on orders.
    pub operator_id: String,
    /// Display name printed on kitchen tickets.
    pub operator_name: String,
    /// Monetary rounding precision (2, 3 or 4 places).
    pub precision: Precision,
    /// When false, no tickets are produced and new lines are marked
    /// ready immediately.
    pub kot_enabled: bool,
    /// Counter receipt printer address; `None` skips physical printing
    /// (the assembled receipt payload is still returned to the caller).
    pub receipt_printer: Option<String>,
}

impl SessionContext {
    /// Context with the common defaults: 2-place rounding, KOT on.
    pub fn new(
        tenant: impl Into<String>,
        counter_id: impl Into<String>,
        operator_id: impl Into<String>,
    ) -> Self {
        let operator_id = operator_id.into();
        SessionContext {
            tenant: tenant.into(),
            counter_id: counter_id.into(),
            operator_name: operator_id.clone(),
            operator_id,
            precision: Precision::TWO,
            kot_enabled: true,
            receipt_printer: None,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_kot_enabled(mut self, enabled: bool) -> Self {
        self.kot_enabled = enabled;
        self
    }

    pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
        self.operator_name = name.into();
        self
    }

    pub fn with_receipt_printer(mut self, addr: impl Into<String>) -> Self {
        self.receipt_printer = Some(addr.into());
        self
    }
}
