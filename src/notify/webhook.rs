//! Webhook notifier.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::notify::Notifier;
use crate::observability::metrics;

/// JSON body posted to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
}

/// Posts notifications to an HTTP endpoint on a background task.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for notifications");
                reqwest::Client::new()
            });
        Self { url, client }
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, subject: &str, body: &str) {
        let payload = WebhookPayload {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        // Outside a runtime there is nowhere to run the request; drop it.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(subject = %subject, "No async runtime, notification dropped");
            metrics::record_notification("webhook", "dropped");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            let result = client.post(&url).json(&payload).send().await;
            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(id = %payload.id, "Notification delivered");
                    metrics::record_notification("webhook", "sent");
                }
                Ok(response) => {
                    tracing::warn!(id = %payload.id, status = %response.status(), "Notification webhook rejected message");
                    metrics::record_notification("webhook", "failed");
                }
                Err(e) => {
                    tracing::warn!(id = %payload.id, error = %e, "Notification delivery failed");
                    metrics::record_notification("webhook", "failed");
                }
            }
        });
    }
}
