//! Connection status published by the bridge.

use std::fmt;

/// Lifecycle of the window manager connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Stopped on request. Terminal.
    Closed,
}

/// Snapshot sent to status observers (tray, headless runner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStatus {
    pub state: ConnectionState,
    /// Why the last session ended, if it failed
    pub error: Option<String>,
    /// Reconnect attempt in progress (0 on the first connect)
    pub attempt: u32,
}

impl BridgeStatus {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            state,
            error: None,
            attempt: 0,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            error: Some(error.into()),
            attempt: 0,
        }
    }
}

impl Default for BridgeStatus {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

/// Text shown in the tray menu.
impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.state, &self.error) {
            (ConnectionState::Connecting, _) if self.attempt > 0 => {
                write!(f, "Status: Reconnecting (attempt {})...", self.attempt)
            }
            (ConnectionState::Connecting, _) => write!(f, "Status: Connecting..."),
            (ConnectionState::Connected, _) => write!(f, "Status: Connected"),
            (ConnectionState::Closed, _) => write!(f, "Status: Stopped"),
            (ConnectionState::Disconnected, Some(error)) => {
                write!(f, "Status: Disconnected ({})", error)
            }
            (ConnectionState::Disconnected, None) => write!(f, "Status: Disconnected"),
        }
    }
}
