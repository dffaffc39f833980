//! Run command - headless bridge in the foreground.

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bridge::{BridgeHandle, BridgeStatus, ConnectionState, EventBridge};
use crate::config::Config;
use crate::error::BridgeError;
use crate::notifications;

/// Run the bridge until Ctrl-C or until it gives up.
pub async fn run_foreground(config: Config) -> Result<()> {
    info!(config_path = ?config.path, "Running bridge in foreground mode");

    let (bridge, handle) = EventBridge::new(config.bridge.clone());
    let mut bridge_task = tokio::spawn(bridge.run());

    let status_task = tokio::spawn(watch_status(handle.status(), config.tray.notifications));

    // Bridge errors are already logged and published by the bridge
    let finished = tokio::select! {
        joined = &mut bridge_task => Some(joined),
        signal = signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Received shutdown signal");
            None
        }
    };

    let result = match finished {
        Some(joined) => joined?,
        None => shutdown(&handle, bridge_task).await,
    };

    // The bridge has dropped its status sender, so the watcher drains the
    // final status and returns
    if let Err(e) = status_task.await {
        error!(error = %e, "Status watcher panicked");
    }
    result.map_err(Into::into)
}

async fn shutdown(
    handle: &BridgeHandle,
    bridge_task: JoinHandle<Result<(), BridgeError>>,
) -> Result<(), BridgeError> {
    handle.stop();
    match bridge_task.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Bridge task panicked");
            Ok(())
        }
    }
}

/// Log status transitions and raise a notification when an established
/// connection is lost. Returns the number of losses once the bridge is gone.
pub async fn watch_status(mut status_rx: watch::Receiver<BridgeStatus>, notify: bool) -> u32 {
    let mut loss = LossDetector::default();
    let mut losses = 0;

    while status_rx.changed().await.is_ok() {
        let status = status_rx.borrow_and_update().clone();
        info!(status = %status, "Bridge status changed");

        if loss.observe(status.state) {
            losses += 1;
            if notify {
                notifications::notify_disconnected(status.error.as_deref());
            }
        }
    }

    losses
}

/// Spots the moment a connected session goes away for any reason other
/// than a requested stop.
#[derive(Debug, Default)]
struct LossDetector {
    connected: bool,
}

impl LossDetector {
    /// Returns true exactly once per lost connection.
    fn observe(&mut self, state: ConnectionState) -> bool {
        let was_connected = self.connected;
        self.connected = state == ConnectionState::Connected;

        was_connected
            && matches!(
                state,
                ConnectionState::Disconnected | ConnectionState::Connecting
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_reported_once() {
        let mut loss = LossDetector::default();
        assert!(!loss.observe(ConnectionState::Connecting));
        assert!(!loss.observe(ConnectionState::Connected));
        assert!(loss.observe(ConnectionState::Disconnected));
        assert!(!loss.observe(ConnectionState::Disconnected));
    }

    #[test]
    fn test_failure_before_connecting_is_not_a_loss() {
        let mut loss = LossDetector::default();
        assert!(!loss.observe(ConnectionState::Connecting));
        assert!(!loss.observe(ConnectionState::Disconnected));
    }

    #[test]
    fn test_requested_stop_is_not_a_loss() {
        let mut loss = LossDetector::default();
        loss.observe(ConnectionState::Connected);
        assert!(!loss.observe(ConnectionState::Closed));
    }

    #[test]
    fn test_reconnect_cycle_reports_each_drop() {
        let mut loss = LossDetector::default();
        loss.observe(ConnectionState::Connected);
        // Dropped, backing off, retrying
        assert!(loss.observe(ConnectionState::Connecting));
        assert!(!loss.observe(ConnectionState::Connecting));
        assert!(!loss.observe(ConnectionState::Connected));
        // Retries exhausted after a second drop
        assert!(loss.observe(ConnectionState::Connecting));
        assert!(!loss.observe(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn test_watch_status_sees_final_status() {
        let (status_tx, status_rx) = watch::channel(BridgeStatus::default());
        let watcher = tokio::spawn(watch_status(status_rx, false));

        status_tx.send_replace(BridgeStatus::new(ConnectionState::Connected));
        // Let the watcher see the connection before it drops
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        status_tx.send_replace(BridgeStatus::failed("Connection closed by window manager"));
        drop(status_tx);

        let losses = tokio::time::timeout(std::time::Duration::from_secs(5), watcher)
            .await
            .expect("status watcher should finish once the bridge is gone")
            .unwrap();
        assert_eq!(losses, 1);
    }
}
