//! Autotile
//!
//! Listens to GlazeWM window events and flips the tiling direction whenever
//! a newly managed window ends up narrower than the configured threshold.

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod autostart;
mod bridge;
mod cli;
mod config;
mod crash;
mod error;
mod notifications;
mod tray;

use cli::{Cli, Command, LogLevel};
use config::Config;
use tracing_appender::non_blocking::WorkerGuard;

fn main() {
    if let Err(e) = real_main() {
        // May fail before the subscriber exists, so report out of band
        show_startup_error(&format!("{:?}", e));
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn show_startup_error(message: &str) {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use windows_sys::Win32::UI::WindowsAndMessaging::{
        MessageBoxW, MB_ICONERROR, MB_SETFOREGROUND, MB_TOPMOST,
    };

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(Some(0)).collect()
    }

    let text = wide(&format!(
        "Autotile could not start.\n\n{}\n\nCheck the configuration with 'autotile config validate'.",
        message
    ));
    let caption = wide("Autotile");

    unsafe {
        MessageBoxW(
            0,
            text.as_ptr(),
            caption.as_ptr(),
            MB_ICONERROR | MB_SETFOREGROUND | MB_TOPMOST,
        );
    }
}

#[cfg(not(windows))]
fn show_startup_error(message: &str) {
    eprintln!("Autotile startup error: {}", message);
}

#[tokio::main]
async fn real_main() -> Result<()> {
    crash::install_panic_hook();

    let cli = Cli::parse();
    let command = cli.command();

    // The tray has no use for a console window
    #[cfg(windows)]
    if matches!(command, Command::Tray) {
        unsafe {
            windows_sys::Win32::System::Console::FreeConsole();
        }
    }

    // Long-running commands log to files, one-shot commands to stderr
    let _guard = init_logging(
        &cli.log_level,
        matches!(command, Command::Run | Command::Tray),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "Autotile starting");

    match command {
        Command::Run => {
            let config = Config::load(cli.config.as_deref())?;
            cli::run::run_foreground(config).await
        }
        Command::Tray => {
            let config = Config::load(cli.config.as_deref())?;
            tray::run_tray(config).await
        }
        Command::Autostart { action } => cli::autostart::run(action),
        Command::Config { action } => cli::config::run(action, cli.config.as_deref()),
        Command::Version => {
            println!("autotile {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`.
///
/// File output is JSON in daily files under the log directory; the returned
/// guard flushes it and must live until exit.
fn init_logging(level: &LogLevel, to_file: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if !to_file {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("autotile")
        .filename_suffix("log")
        .max_log_files(7)
        .build(config::paths::log_dir()?)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    registry
        .with(fmt::layer().json().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}
