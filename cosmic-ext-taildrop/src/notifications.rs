//! Desktop notifications for finished transfers

use cosmic_ext_taildrop_core::{TransferMode, TransferOutcome};
use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

/// Application name for notifications
const APP_NAME: &str = "Taildrop";

/// Default timeout for notifications (5 seconds)
const DEFAULT_TIMEOUT_MS: u32 = 5000;

fn show_notification(title: &str, body: &str, icon: &str) {
    debug!("Showing notification: {} - {}", title, body);

    if let Err(e) = Notification::new()
        .appname(APP_NAME)
        .summary(title)
        .body(body)
        .icon(icon)
        .timeout(Timeout::Milliseconds(DEFAULT_TIMEOUT_MS))
        .show()
    {
        warn!("Failed to show notification: {}", e);
    }
}

fn summary(outcome: &TransferOutcome) -> &'static str {
    match outcome.mode {
        TransferMode::Send => "Transfer Complete",
        TransferMode::Receive => "Files Received",
    }
}

fn icon(outcome: &TransferOutcome) -> &'static str {
    match outcome.mode {
        TransferMode::Send => "document-send-symbolic",
        TransferMode::Receive => "folder-download-symbolic",
    }
}

/// Notify about a successful transfer
pub fn notify_transfer_complete(outcome: &TransferOutcome) {
    show_notification(summary(outcome), &outcome.message, icon(outcome));
}
