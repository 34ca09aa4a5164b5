//! # KOT Dispatch
//!
//! Sends the per-category ticket batches of one KOT to their kitchen
//! station printers. The order is already committed when dispatch runs:
//! print failures are collected per category and reported inside the
//! success payload, never rolled back.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::remote::TicketPrinter;
use dhaba_core::KotRequest;
use dhaba_db::MenuRepository;

/// One category's dispatch failure. Retryable independently.
#[derive(Debug, Clone)]
pub struct PrintDispatchError {
    pub kitchen_cat_name: String,
    pub reason: String,
}

/// Outcome of dispatching one KOT across its kitchen stations.
#[derive(Debug, Clone, Default)]
pub struct KotDispatchReport {
    /// Categories whose ticket reached the printer.
    pub printed: Vec<String>,
    /// Categories whose ticket did not, with a reason each.
    pub failures: Vec<PrintDispatchError>,
}

impl KotDispatchReport {
    /// Whether every station got its ticket.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolves the printer per kitchen category and dispatches tickets.
pub struct KotDispatcher {
    menu: MenuRepository,
    printer: Arc<dyn TicketPrinter>,
}

impl KotDispatcher {
    pub fn new(menu: MenuRepository, printer: Arc<dyn TicketPrinter>) -> Self {
        KotDispatcher { menu, printer }
    }

    /// Dispatches one KOT's batches, one ticket per kitchen category.
    ///
    /// A category without a configured station, a station lookup error
    /// and a printer transport error all land in `failures`; the other
    /// categories still print.
    pub async fn dispatch(&self, batches: &BTreeMap<String, KotRequest>) -> KotDispatchReport {
        let mut report = KotDispatchReport::default();

        for (category, request) in batches {
            let station = match self.menu.get_station(category).await {
                Ok(Some(station)) => station,
                Ok(None) => {
                    warn!(category = %category, "No printer station configured");
                    report.failures.push(PrintDispatchError {
                        kitchen_cat_name: category.clone(),
                        reason: "no printer station configured".to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    report.failures.push(PrintDispatchError {
                        kitchen_cat_name: category.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.printer.print_kot(&station.printer_addr, request).await {
                Ok(()) => {
                    info!(
                        category = %category,
                        kot_number = request.kot_number,
                        printer = %station.printer_addr,
                        "KOT ticket printed"
                    );
                    report.printed.push(category.clone());
                }
                Err(e) => {
                    warn!(
                        category = %category,
                        kot_number = request.kot_number,
                        error = %e,
                        "KOT ticket dispatch failed"
                    );
                    report.failures.push(PrintDispatchError {
                        kitchen_cat_name: category.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
