//! Crash reporting and panic handling.

use std::backtrace::Backtrace;
use std::fs;
use std::panic::PanicHookInfo;

use crate::config::paths;

/// Install the panic hook for crash reporting.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        handle_panic(panic_info);
    }));
}

fn handle_panic(panic_info: &PanicHookInfo) {
    let backtrace = Backtrace::force_capture();

    let message = panic_message(panic_info.payload());
    let location = panic_info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_else(|| "unknown location".to_string());

    tracing::error!(message = %message, location = %location, "Panic");

    let report = build_crash_report(&message, &location, &backtrace.to_string());
    let crash_file = write_crash_report(&report);

    show_crash_dialog(crash_file.as_deref());
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn build_crash_report(message: &str, location: &str, backtrace: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let os_info = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);

    format!(
        r#"Autotile Crash Report
=====================

Version: {version}
Timestamp: {timestamp}
OS: {os_info}

Panic Message:
{message}

Location:
{location}

Backtrace:
{backtrace}
"#
    )
}

fn write_crash_report(report: &str) -> Option<String> {
    let log_dir = paths::log_dir().ok()?;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let path = log_dir.join(format!("crash_{}.txt", timestamp));

    fs::write(&path, report).ok()?;
    Some(path.display().to_string())
}

#[cfg(windows)]
fn show_crash_dialog(crash_file: Option<&str>) {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    let file_info = crash_file
        .map(|f| format!("\n\nCrash report saved to:\n{}", f))
        .unwrap_or_default();

    let message = format!("Autotile has crashed unexpectedly.{}", file_info);
    let title = "Autotile - Crash";

    let title_wide: Vec<u16> = OsStr::new(title).encode_wide().chain(Some(0)).collect();
    let message_wide: Vec<u16> = OsStr::new(&message).encode_wide().chain(Some(0)).collect();

    // MB_OK = 0, MB_ICONERROR = 0x10
    let flags: u32 = 0x10;

    unsafe {
        windows_sys::Win32::UI::WindowsAndMessaging::MessageBoxW(
            0,
            message_wide.as_ptr(),
            title_wide.as_ptr(),
            flags,
        );
    }
}

#[cfg(not(windows))]
fn show_crash_dialog(crash_file: Option<&str>) {
    eprintln!("Autotile crashed!");
    if let Some(f) = crash_file {
        eprintln!("Crash report saved to: {}", f);
    }
}
