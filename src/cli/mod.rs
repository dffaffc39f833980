//! CLI command definitions and handlers.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod autostart;
pub mod config;
pub mod run;

/// Autotile - flips the tiling direction of narrow windows in GlazeWM.
#[derive(Parser, Debug)]
#[command(name = "autotile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info", env = "AUTOTILE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Path to config file
    #[arg(long, global = true, env = "AUTOTILE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command. Without one, Autotile starts the tray on
    /// Windows and the headless runner elsewhere.
    pub fn command(&self) -> Command {
        match &self.command {
            Some(command) => command.clone(),
            None if cfg!(windows) => Command::Tray,
            None => Command::Run,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run with a system tray icon (Windows only)
    Tray,

    /// Run the bridge in the foreground until Ctrl-C
    Run,

    /// Manage starting Autotile at login
    Autostart {
        #[command(subcommand)]
        action: AutostartAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum AutostartAction {
    /// Show whether autostart is enabled for this executable
    Status,

    /// Start this executable at login
    Enable,

    /// Stop starting at login
    Disable,

    /// Flip the current state
    Toggle,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Validate configuration file
    Validate,

    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_uses_platform_default() {
        let cli = Cli::try_parse_from(["autotile"]).unwrap();
        let expected_tray = cfg!(windows);
        assert_eq!(matches!(cli.command(), Command::Tray), expected_tray);
        assert_eq!(matches!(cli.command(), Command::Run), !expected_tray);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "autotile",
            "autostart",
            "toggle",
            "--log-level",
            "debug",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert!(matches!(
            cli.command(),
            Command::Autostart {
                action: AutostartAction::Toggle
            }
        ));
        assert_eq!(cli.log_level.as_str(), "debug");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["autotile", "--log-level", "loud"]).is_err());
    }
}
