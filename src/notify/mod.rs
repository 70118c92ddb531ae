//! Operator notification subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle controller transition
//!     → Notifier::send(subject, body)   (returns immediately)
//!     → log.rs      (warn-level event)
//!     → webhook.rs  (spawned POST, failures logged)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: `send` has no return value and never blocks
//! - No retries and no de-duplication here; webhook payloads carry a uuid
//!   so receivers can de-duplicate

pub mod log;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use crate::config::NotifyConfig;

pub use self::log::LogNotifier;
pub use self::webhook::WebhookNotifier;

/// Delivers a subject/body message to operators.
pub trait Notifier: Send + Sync {
    fn send(&self, subject: &str, body: &str);
}

/// Build the notifier selected by configuration.
pub fn build_notifier(config: &NotifyConfig) -> Arc<dyn Notifier> {
    match &config.webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Channel notifications go to webhook");
            Arc::new(WebhookNotifier::new(
                url.clone(),
                Duration::from_secs(config.timeout_secs),
            ))
        }
        None => {
            tracing::info!("No notify webhook configured, channel notifications are logged only");
            Arc::new(LogNotifier)
        }
    }
}
