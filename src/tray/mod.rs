//! System tray shell for Windows.
//!
//! Shows the bridge status, toggles autostart and quits. Other platforms run
//! headless (`autotile run`).

#[cfg_attr(not(windows), allow(dead_code))]
mod icon;

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::run_tray;

#[cfg(not(windows))]
pub async fn run_tray(_config: crate::config::Config) -> anyhow::Result<()> {
    anyhow::bail!("System tray is only supported on Windows; use 'autotile run'")
}

/// Menu label for the autostart toggle.
#[cfg_attr(not(windows), allow(dead_code))]
fn autostart_label(enabled: bool) -> &'static str {
    if enabled {
        "✓ Autostart enabled"
    } else {
        "Autostart disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autostart_label() {
        assert_eq!(autostart_label(true), "✓ Autostart enabled");
        assert_eq!(autostart_label(false), "Autostart disabled");
    }
}
