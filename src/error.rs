//! Error types for Autotile.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end a bridge session.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("Failed to send '{command}': {source}")]
    Send {
        command: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("Read error: {0}")]
    Read(#[source] tungstenite::Error),

    #[error("Connection closed by window manager")]
    Closed,

    #[error("Gave up reconnecting after {0} attempts")]
    RetryExhausted(u32),
}

/// Errors from the autostart store.
#[derive(Error, Debug)]
pub enum AutostartError {
    #[error("Could not determine current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("Could not locate {0}")]
    Location(&'static str),

    #[error("Autostart store error at {location}: {source}")]
    Store {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl AutostartError {
    pub(crate) fn store(location: impl Into<String>, source: std::io::Error) -> Self {
        AutostartError::Store {
            location: location.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),
}
