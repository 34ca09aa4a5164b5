//! # Connectivity Monitor
//!
//! A `tokio::sync::watch` channel carrying the current online/offline
//! state. Whatever probes the network (transport heartbeat, OS events)
//! flips the flag through [`ConnectivityHandle`]; the reconciler
//! subscribes and runs an immediate pass when connectivity is regained.

use tokio::sync::watch;
use tracing::info;

/// Write side of the connectivity state.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    tx: watch::Sender<bool>,
}

impl ConnectivityHandle {
    /// Updates the connectivity state. No-op when unchanged.
    pub fn set_online(&self, online: bool) {
        let changed = *self.tx.borrow() != online;
        if changed {
            info!(online, "Connectivity changed");
            let _ = self.tx.send(online);
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// A fresh subscription to state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Creates the connectivity channel with an initial state.
pub fn connectivity_channel(initially_online: bool) -> (ConnectivityHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(initially_online);
    (ConnectivityHandle { tx }, rx)
}
