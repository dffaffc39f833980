//! Event bridge between the window manager and the tiling policy.
//!
//! One task owns the WebSocket for its whole life: it connects, subscribes
//! to `window_managed` events, and answers every event whose tiling size is
//! at or below the threshold with a toggle-tiling-direction command.
//!
//! Other parts of the program never touch the socket. They hold a
//! [`BridgeHandle`], which can request a stop and observe [`BridgeStatus`]
//! updates. A stop closes the connection from inside the owning task, so a
//! pending read is always abandoned cleanly.

pub mod event;
pub mod policy;
pub mod status;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;

pub use policy::{Decision, IgnoreReason, TilingPolicy};
pub use status::{BridgeStatus, ConnectionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a connected session ended without an error.
enum SessionEnd {
    Stopped,
    /// The connection is unusable but nothing is wrong with the peer.
    Reopen,
}

/// The bridge task. Consumed by [`EventBridge::run`].
pub struct EventBridge {
    config: BridgeConfig,
    policy: TilingPolicy,
    status_tx: watch::Sender<BridgeStatus>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Control side of a running bridge.
#[derive(Clone)]
pub struct BridgeHandle {
    shutdown_tx: mpsc::Sender<()>,
    status_rx: watch::Receiver<BridgeStatus>,
}

impl BridgeHandle {
    /// Ask the bridge to close its connection and exit.
    ///
    /// Safe to call any number of times, including after the bridge has
    /// already finished.
    pub fn stop(&self) {
        if self.shutdown_tx.try_send(()).is_ok() {
            debug!("Bridge stop requested");
        }
    }

    /// Receiver for status updates.
    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.status_rx.clone()
    }

    /// Latest published status.
    pub fn current(&self) -> BridgeStatus {
        self.status_rx.borrow().clone()
    }
}

impl EventBridge {
    pub fn new(config: BridgeConfig) -> (Self, BridgeHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = watch::channel(BridgeStatus::default());

        let bridge = Self {
            policy: TilingPolicy::new(config.tiling_threshold),
            config,
            status_tx,
            shutdown_rx,
        };
        let handle = BridgeHandle {
            shutdown_tx,
            status_rx,
        };

        (bridge, handle)
    }

    /// Run until stopped or until the connection is lost for good.
    ///
    /// Returns `Ok(())` after a requested stop. Any other exit is an error;
    /// the error text is also published as the final status.
    pub async fn run(mut self) -> Result<(), BridgeError> {
        info!(
            url = %self.config.url,
            threshold = self.policy.threshold(),
            reconnect = self.config.reconnect.enabled,
            "Event bridge starting"
        );

        let result = self.run_sessions().await;

        match &result {
            Ok(()) => {
                info!("Event bridge stopped");
                self.publish(BridgeStatus::new(ConnectionState::Closed));
            }
            Err(e) => {
                error!(error = %e, "Event bridge terminated");
                self.publish(BridgeStatus::failed(e.to_string()));
            }
        }

        result
    }

    async fn run_sessions(&mut self) -> Result<(), BridgeError> {
        let reconnect = self.config.reconnect.clone();
        let mut schedule = ExponentialBackoff {
            current_interval: reconnect.initial_delay(),
            initial_interval: reconnect.initial_delay(),
            max_interval: reconnect.max_delay(),
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        let mut attempt: u32 = 0;
        let mut last_error: Option<BridgeError> = None;

        loop {
            if let Some(err) = last_error.take() {
                attempt += 1;
                if reconnect.max_attempts > 0 && attempt > reconnect.max_attempts {
                    warn!(error = %err, "Last reconnect attempt failed");
                    return Err(BridgeError::RetryExhausted(reconnect.max_attempts));
                }

                let delay = schedule.next_backoff().unwrap_or(reconnect.max_delay());
                warn!(
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Connection to window manager lost, reconnecting"
                );
                self.publish(BridgeStatus {
                    state: ConnectionState::Connecting,
                    error: Some(err.to_string()),
                    attempt,
                });

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.shutdown_rx.recv() => {
                        debug!("Stop requested while waiting to reconnect");
                        return Ok(());
                    }
                }
            }

            let mut ws = match self.connect(attempt).await {
                Ok(Some(ws)) => ws,
                Ok(None) => return Ok(()),
                Err(e) if reconnect.enabled => {
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            attempt = 0;
            schedule.reset();

            let outcome = match self.subscribe(&mut ws).await {
                Ok(()) => self.pump(&mut ws).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(SessionEnd::Stopped) => return Ok(()),
                Ok(SessionEnd::Reopen) => continue,
                Err(e) if reconnect.enabled => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }
    }

    /// Open the connection. Returns `Ok(None)` if a stop arrived first.
    async fn connect(&mut self, attempt: u32) -> Result<Option<WsStream>, BridgeError> {
        self.publish(BridgeStatus {
            state: ConnectionState::Connecting,
            error: None,
            attempt,
        });
        debug!(url = %self.config.url, attempt, "Connecting to window manager");

        tokio::select! {
            result = connect_async(self.config.url.as_str()) => {
                let (ws, _response) = result.map_err(|source| BridgeError::Connect {
                    url: self.config.url.clone(),
                    source,
                })?;
                info!(url = %self.config.url, "Connected to window manager");
                self.publish(BridgeStatus::new(ConnectionState::Connected));
                Ok(Some(ws))
            }
            _ = self.shutdown_rx.recv() => {
                debug!("Stop requested while connecting");
                Ok(None)
            }
        }
    }

    /// Request the event stream. No acknowledgement is awaited.
    async fn subscribe(&self, ws: &mut WsStream) -> Result<(), BridgeError> {
        send_text(ws, &self.config.subscribe_command).await?;
        info!(command = %self.config.subscribe_command, "Subscribed to window events");
        Ok(())
    }

    /// Read loop. Returns `Ok` only when stopped or when the session has to
    /// be reopened; every other exit is an error.
    async fn pump(&mut self, ws: &mut WsStream) -> Result<SessionEnd, BridgeError> {
        loop {
            let payload = tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    debug!("Stop requested, closing connection");
                    close(ws).await;
                    return Ok(SessionEnd::Stopped);
                }
                message = ws.next() => match message {
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    Some(Ok(Message::Binary(bytes))) => bytes,
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Window manager closed the connection");
                        return Err(BridgeError::Closed);
                    }
                    // Ping/pong are answered by tungstenite itself
                    Some(Ok(_)) => continue,
                    // The stream yields nothing after a read error, so a bad
                    // text frame costs the connection but not the bridge
                    Some(Err(tungstenite::Error::Utf8)) => {
                        warn!("Text frame is not valid UTF-8, reopening connection");
                        close(ws).await;
                        return Ok(SessionEnd::Reopen);
                    }
                    Some(Err(e)) => return Err(BridgeError::Read(e)),
                    None => return Err(BridgeError::Closed),
                },
            };

            if !self.wants_toggle(&payload) {
                continue;
            }

            // A peer that stops reading must not block a stop request
            tokio::select! {
                result = send_text(ws, &self.config.toggle_command) => result?,
                _ = self.shutdown_rx.recv() => {
                    debug!("Stop requested while sending, dropping connection");
                    return Ok(SessionEnd::Stopped);
                }
            }
        }
    }

    fn wants_toggle(&self, payload: &[u8]) -> bool {
        match self.policy.evaluate(payload) {
            Decision::Toggle { tiling_size } => {
                info!(tiling_size, "Window at or below threshold, toggling tiling direction");
                true
            }
            Decision::Ignore(IgnoreReason::Malformed) => {
                debug!(len = payload.len(), "Skipping undecodable message");
                false
            }
            Decision::Ignore(IgnoreReason::NoTilingSize) => {
                trace!("Skipping message without tiling size");
                false
            }
            Decision::Ignore(IgnoreReason::AboveThreshold(tiling_size)) => {
                debug!(tiling_size, "Window above threshold, leaving layout alone");
                false
            }
        }
    }

    fn publish(&self, status: BridgeStatus) {
        self.status_tx.send_replace(status);
    }
}

async fn close(ws: &mut WsStream) {
    if let Err(e) = ws.close(None).await {
        debug!(error = %e, "Close handshake failed");
    }
}

async fn send_text(ws: &mut WsStream, command: &str) -> Result<(), BridgeError> {
    ws.send(Message::Text(command.to_string()))
        .await
        .map_err(|source| BridgeError::Send {
            command: command.to_string(),
            source,
        })
}
