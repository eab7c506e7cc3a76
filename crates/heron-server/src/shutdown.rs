//! Graceful shutdown.
//!
//! [`ShutdownSignal`] tells the accept loop and every open connection to
//! stop; [`ConnectionTracker`] lets the server wait for the connections it
//! already accepted to finish.
//!
//! # Example
//!
//! ```
//! use heron_server::shutdown::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let observer = shutdown.clone();
//!
//! shutdown.trigger();
//! assert!(observer.is_shutdown());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable, one-shot shutdown flag.
///
/// All clones share the same state. Triggering is idempotent, and
/// [`recv`](Self::recv) completes immediately once the flag is set.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal that triggers on SIGTERM or SIGINT.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            if wait_for_os_signal().await {
                trigger.trigger();
            }
        });

        signal
    }

    /// Sets the flag and wakes every waiter.
    pub fn trigger(&self) {
        let was_triggered = self.sender.send_replace(true);
        if !was_triggered {
            tracing::debug!("Shutdown triggered");
        }
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Waits until shutdown is triggered.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `false` if no signal handler could be installed.
async fn wait_for_os_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
                }
                return true;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to register signal handlers, falling back to Ctrl+C");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, shutting down");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            false
        }
    }
}

/// Counts accepted connections so shutdown can wait for them to drain.
///
/// ```
/// use heron_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no active connections.
    #[must_use]
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self {
            active: Arc::new(active),
        }
    }

    /// Registers a connection until the returned token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.send_modify(|count| *count += 1);
        ConnectionToken {
            active: Arc::clone(&self.active),
        }
    }

    /// Returns the number of connections currently held.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.active.borrow()
    }

    /// Waits until every token has been dropped.
    pub async fn drained(&self) {
        let mut receiver = self.active.subscribe();
        let _ = receiver.wait_for(|count| *count == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a connection task for as long as the connection is open.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.active
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
