//! Configuration management for Autotile.
//!
//! Every field has a default, and a missing config file is not an error:
//! out of the box Autotile talks to GlazeWM on `ws://localhost:6123`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub mod paths;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was loaded from (empty when using defaults)
    #[serde(skip)]
    pub path: PathBuf,

    /// Window manager connection and tiling policy
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Tray behaviour
    #[serde(default)]
    pub tray: TrayConfig,
}

impl Config {
    /// Load configuration from an explicit path, or the default location.
    ///
    /// Falls back to defaults when the default file does not exist. An
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = paths::config_file();
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    tracing::debug!(path = %default_path.display(), "No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.path = path.to_path_buf();

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bridge = &self.bridge;

        if !bridge.url.starts_with("ws://") {
            return Err(ConfigError::Invalid(format!(
                "bridge.url must be a ws:// address, got '{}'",
                bridge.url
            )));
        }
        if bridge.subscribe_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "bridge.subscribe_command is empty".to_string(),
            ));
        }
        if bridge.toggle_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "bridge.toggle_command is empty".to_string(),
            ));
        }
        if !bridge.tiling_threshold.is_finite() || !(0.0..=1.0).contains(&bridge.tiling_threshold)
        {
            return Err(ConfigError::Invalid(format!(
                "bridge.tiling_threshold must be between 0 and 1, got {}",
                bridge.tiling_threshold
            )));
        }

        let reconnect = &bridge.reconnect;
        if reconnect.enabled {
            if reconnect.initial_delay_ms == 0 {
                return Err(ConfigError::Invalid(
                    "bridge.reconnect.initial_delay_ms must be positive".to_string(),
                ));
            }
            if reconnect.max_delay_ms < reconnect.initial_delay_ms {
                return Err(ConfigError::Invalid(format!(
                    "bridge.reconnect.max_delay_ms ({}) is below initial_delay_ms ({})",
                    reconnect.max_delay_ms, reconnect.initial_delay_ms
                )));
            }
        }

        Ok(())
    }
}

/// Window manager connection and tiling policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// WebSocket address of the window manager IPC server
    #[serde(default = "default_url")]
    pub url: String,

    /// Sent once right after connecting
    #[serde(default = "default_subscribe_command")]
    pub subscribe_command: String,

    /// Sent whenever a managed window is at or below the threshold
    #[serde(default = "default_toggle_command")]
    pub toggle_command: String,

    /// Inclusive upper bound of the tiling size ratio that triggers a toggle
    #[serde(default = "default_tiling_threshold")]
    pub tiling_threshold: f64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_url() -> String {
    "ws://localhost:6123".to_string()
}

fn default_subscribe_command() -> String {
    "sub -e window_managed".to_string()
}

fn default_toggle_command() -> String {
    "command toggle-tiling-direction".to_string()
}

fn default_tiling_threshold() -> f64 {
    0.5
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            subscribe_command: default_subscribe_command(),
            toggle_command: default_toggle_command(),
            tiling_threshold: default_tiling_threshold(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnect behaviour. Disabled by default: the bridge gives up on the
/// first connection failure or lost connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub enabled: bool,

    /// First delay between attempts in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the delay between attempts in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive failed attempts before giving up (0 = never give up)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Tray configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrayConfig {
    /// Show a toast when the connection to the window manager is lost
    #[serde(default)]
    pub notifications: bool,
}
