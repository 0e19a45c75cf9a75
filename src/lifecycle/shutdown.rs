//! Shutdown coordination for the relay.

use tokio::sync::broadcast;

use crate::lifecycle::signals::os_shutdown_signal;

/// Coordinator for graceful shutdown.
///
/// Anything holding a receiver stops when [`Shutdown::trigger`] is called.
/// Tests use it to stop servers they spawned; `main` ties it to OS signals.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on the first of an OS shutdown signal or a coordinator trigger.
pub async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = os_shutdown_signal() => {}
        _ = rx.recv() => {
            tracing::info!("Shutdown requested");
        }
    }
}
