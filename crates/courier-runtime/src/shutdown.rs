//! Graceful shutdown with signal handling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

/// Shutdown signal shared by the server and whoever stops it
///
/// Late subscribers still observe a trigger that happened before they
/// subscribed.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wait until shutdown is triggered
    pub async fn wait(&self) {
        let mut rx = self.sender.subscribe();
        // An error means the sender is gone, which only happens on drop
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            self.sender.send_replace(true);
            tracing::info!("Shutdown signal triggered");
        }
    }

    /// Check if shutdown was triggered
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal handler for OS signals
#[derive(Debug)]
pub struct SignalHandler {
    signal: ShutdownSignal,
}

impl SignalHandler {
    /// Create a new signal handler
    pub fn new(signal: ShutdownSignal) -> Self {
        Self { signal }
    }

    /// Wait for SIGINT or SIGTERM (Ctrl+C elsewhere) and trigger shutdown
    pub async fn run(self) {
        #[cfg(unix)]
        {
            use signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::error!(error = %e, "Failed to install signal handlers");
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
            self.signal.trigger();
        }

        #[cfg(not(unix))]
        {
            match signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C");
                    self.signal.trigger();
                }
                Err(err) => {
                    tracing::error!("Failed to listen for Ctrl+C: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_new() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_late_waiter_sees_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }
}
