//! Desktop notification for run outcomes.
//!
//! Fire-and-forget: a failed notification is logged and never propagated.

use notify_rust::Notification;
use tracing::{debug, warn};

/// Settings for run notifications.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Application name shown by the notification daemon.
    pub app_name: String,
    /// Notification timeout in seconds.
    pub timeout_secs: u32,
    /// Whether notifications are enabled at all.
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            app_name: "railsync".to_string(),
            timeout_secs: 10,
            enabled: true,
        }
    }
}

/// Shows a desktop notification, swallowing any failure.
pub fn notify(config: &NotifyConfig, summary: &str, body: &str) {
    if !config.enabled {
        debug!("notifications disabled");
        return;
    }

    let result = Notification::new()
        .appname(&config.app_name)
        .summary(summary)
        .body(body)
        .timeout(notify_rust::Timeout::Milliseconds(
            config.timeout_secs * 1000,
        ))
        .show();

    match result {
        Ok(_) => debug!(summary, "notification shown"),
        Err(e) => warn!(error = %e, "notification failed"),
    }
}
