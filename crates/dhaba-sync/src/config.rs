//! Reconciler configuration.

use std::time::Duration;

/// Tuning knobs for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Seconds between periodic passes.
    pub poll_interval_secs: u64,
    /// Maximum rows pulled per entity kind per pass.
    pub batch_size: u32,
    /// Push attempts before a row is tagged `sync_failed`.
    /// Such rows are still retried on later passes.
    pub max_attempts: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval_secs: 5,
            batch_size: 50,
            max_attempts: 10,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
