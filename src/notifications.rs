//! Toast notifications for Windows.
//!
//! Only connection loss is announced; everything else goes to the log.

use tracing::debug;
#[cfg(windows)]
use tracing::warn;

/// Show a toast notification when the window manager connection is lost.
pub fn notify_disconnected(error: Option<&str>) {
    let body = disconnected_body(error);

    #[cfg(windows)]
    {
        use winrt_notification::{Duration, Sound, Toast};

        debug!("Showing disconnect notification");

        let result = Toast::new(Toast::POWERSHELL_APP_ID)
            .title("Autotile disconnected")
            .text1(&body)
            .sound(Some(Sound::Default))
            .duration(Duration::Short)
            .show();

        if let Err(e) = result {
            warn!(error = %e, "Failed to show toast notification");
        }
    }

    #[cfg(not(windows))]
    {
        debug!(body = %body, "Disconnected (notifications not supported)");
    }
}

fn disconnected_body(error: Option<&str>) -> String {
    const MAX_LEN: usize = 100;

    match error {
        Some(error) if error.chars().count() > MAX_LEN => {
            let short: String = error.chars().take(MAX_LEN).collect();
            format!("{}...", short)
        }
        Some(error) => error.to_string(),
        None => "Lost connection to the window manager".to_string(),
    }
}
