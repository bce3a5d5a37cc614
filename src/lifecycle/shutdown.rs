//! Shutdown coordination.

use std::fmt;

use tokio::sync::broadcast;

/// Why the process is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Triggered programmatically, or the coordinator was dropped.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownReason::Interrupt => "interrupt",
            ShutdownReason::Terminate => "terminate",
            ShutdownReason::Requested => "requested",
        })
    }
}

/// Coordinator for graceful shutdown.
///
/// Every long-running task takes a [`ShutdownSignal`] and stops once it
/// resolves.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self, reason: ShutdownReason) {
        let _ = self.tx.send(reason);
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the shutdown broadcast.
pub struct ShutdownSignal {
    rx: broadcast::Receiver<ShutdownReason>,
}

impl ShutdownSignal {
    /// Resolve with the reason once shutdown is triggered.
    pub async fn recv(mut self) -> ShutdownReason {
        self.rx.recv().await.unwrap_or(ShutdownReason::Requested)
    }
}
