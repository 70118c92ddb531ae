//! Log-only notifier.

use crate::notify::Notifier;
use crate::observability::metrics;

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, subject: &str, body: &str) {
        tracing::warn!(subject = %subject, body = %body, "Channel notification");
        metrics::record_notification("log", "sent");
    }
}
