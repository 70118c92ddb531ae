//! Channel lifecycle controller.
//!
//! # Responsibilities
//! - Turn a finished upstream call into a channel decision
//! - Write the resulting status through the channel store
//! - Notify operators about automatic transitions
//!
//! # Design Decisions
//! - Runs inline on the request path; only the notification leaves it
//! - Store and notify failures are logged, never returned to the caller
//! - Repeated transitions are written and notified again; suppressing
//!   duplicates is the notifier's business
//! - `ManuallyDisabled` channels are never touched by automatic transitions

use std::sync::Arc;

use crate::channel::{ChannelRecord, ChannelStatus, ChannelStore, StoreError};
use crate::config::ChannelHealthConfig;
use crate::health::classifier::{Decision, ErrorClassifier};
use crate::health::outcome::UpstreamOutcome;
use crate::notify::Notifier;
use crate::observability::metrics;

/// Subject and body for an auto-disable notification.
pub fn disabled_message(channel: &ChannelRecord, reason: &str) -> (String, String) {
    let subject = format!("Channel \"{}\" (#{}) has been disabled", channel.name, channel.id);
    let body = format!("{}, reason: {}", subject, reason);
    (subject, body)
}

/// Subject and body for an auto-enable notification.
pub fn enabled_message(channel: &ChannelRecord) -> (String, String) {
    let subject = format!("Channel \"{}\" (#{}) has been enabled", channel.name, channel.id);
    (subject.clone(), subject)
}

/// Orchestrates classifier, store and notifier for channel transitions.
pub struct LifecycleController {
    store: Arc<dyn ChannelStore>,
    notifier: Arc<dyn Notifier>,
    classifier: ErrorClassifier,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn ChannelStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            classifier: ErrorClassifier::default(),
        }
    }

    /// Handle the outcome of one upstream call made through `channel`.
    ///
    /// `policy` must be read from the live config by the caller, so that
    /// flag changes apply to the next call.
    pub fn on_outcome(
        &self,
        policy: &ChannelHealthConfig,
        channel: &ChannelRecord,
        outcome: &UpstreamOutcome,
    ) -> Decision {
        if outcome.is_success() {
            return self.on_success(policy, channel);
        }
        if self.current_status(channel) == ChannelStatus::ManuallyDisabled {
            tracing::debug!(
                channel_id = channel.id,
                "Failure on manually disabled channel ignored"
            );
            return Decision::NoAction;
        }

        let decision = self
            .classifier
            .classify_disable(policy, channel.channel_type, outcome);
        metrics::record_decision(decision.label());

        match &decision {
            Decision::Disable { reason } => {
                self.disable(channel, reason, policy.notify_on_disable);
            }
            _ => {
                if let Some(err) = outcome.error() {
                    tracing::debug!(
                        channel_id = channel.id,
                        status_code = err.status_code,
                        local = err.local,
                        "Upstream failure kept channel in rotation"
                    );
                }
            }
        }
        decision
    }

    /// Handle a clean upstream success on `channel`.
    pub fn on_success(&self, policy: &ChannelHealthConfig, channel: &ChannelRecord) -> Decision {
        if self.current_status(channel) != ChannelStatus::AutoDisabled {
            return Decision::NoAction;
        }

        let decision = self
            .classifier
            .classify_enable(policy, &UpstreamOutcome::Success);
        metrics::record_decision(decision.label());

        if decision == Decision::Enable {
            self.enable(channel, policy.notify_on_enable);
        }
        decision
    }

    /// Operator-requested status change. Never notifies.
    pub fn apply_manual(&self, channel: &ChannelRecord, status: ChannelStatus) -> Result<(), StoreError> {
        self.store.update_channel_status(channel.id, status)?;
        metrics::record_transition(status.as_str());
        tracing::info!(
            channel_id = channel.id,
            channel_name = %channel.name,
            status = status.as_str(),
            "Channel status changed by operator"
        );
        Ok(())
    }

    /// The stored status wins over the caller's copy, which may predate an
    /// operator change.
    fn current_status(&self, channel: &ChannelRecord) -> ChannelStatus {
        self.store
            .get(channel.id)
            .map_or(channel.status, |stored| stored.status)
    }

    fn disable(&self, channel: &ChannelRecord, reason: &str, send_notify: bool) {
        if let Err(e) = self
            .store
            .update_channel_status(channel.id, ChannelStatus::AutoDisabled)
        {
            tracing::error!(channel_id = channel.id, error = %e, "Failed to auto-disable channel");
            return;
        }
        metrics::record_transition(ChannelStatus::AutoDisabled.as_str());
        tracing::warn!(
            channel_id = channel.id,
            channel_name = %channel.name,
            reason = %reason,
            "Channel auto-disabled"
        );

        if send_notify {
            let (subject, body) = disabled_message(channel, reason);
            self.notifier.send(&subject, &body);
        }
    }

    fn enable(&self, channel: &ChannelRecord, send_notify: bool) {
        if let Err(e) = self
            .store
            .update_channel_status(channel.id, ChannelStatus::Enabled)
        {
            tracing::error!(channel_id = channel.id, error = %e, "Failed to re-enable channel");
            return;
        }
        metrics::record_transition(ChannelStatus::Enabled.as_str());
        tracing::info!(channel_id = channel.id, channel_name = %channel.name, "Channel auto-enabled");

        if send_notify {
            let (subject, body) = enabled_message(channel);
            self.notifier.send(&subject, &body);
        }
    }
}
