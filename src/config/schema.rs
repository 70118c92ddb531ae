//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelStatus, ChannelType};

/// Root configuration for the channel relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream channels seeded into the channel store at startup.
    pub channels: Vec<ChannelConfig>,

    /// Automatic enable/disable policy.
    pub channel_health: ChannelHealthConfig,

    /// Operator notification settings.
    pub notify: NotifyConfig,

    /// Channel store persistence.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub payments: PaymentsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// A single upstream channel definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Unique channel identifier.
    pub id: i64,

    /// Display name used in logs and notifications.
    pub name: String,

    /// Upstream provider family.
    #[serde(rename = "type")]
    pub channel_type: ChannelType,

    /// Initial status (default: enabled).
    #[serde(default)]
    pub status: ChannelStatus,
}

/// Policy for automatic channel status transitions.
///
/// Read fresh from the live config on every decision, so a reload takes
/// effect on the next reported outcome.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelHealthConfig {
    /// Allow fatal upstream failures to auto-disable a channel.
    pub automatic_disable: bool,

    /// Allow a successful call to re-enable an auto-disabled channel.
    pub automatic_enable: bool,

    /// Send an operator notification when a channel is disabled.
    pub notify_on_disable: bool,

    /// Send an operator notification when a channel is re-enabled.
    pub notify_on_enable: bool,

    /// Provider families whose 403 responses mean quota/safety rejection.
    pub forbidden_disables: Vec<ChannelType>,
}

impl Default for ChannelHealthConfig {
    fn default() -> Self {
        Self {
            automatic_disable: false,
            automatic_enable: false,
            notify_on_disable: true,
            notify_on_enable: true,
            forbidden_disables: vec![ChannelType::Gemini],
        }
    }
}

/// Operator notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Webhook receiving `{id, subject, body}` JSON. Log-only when unset.
    pub webhook_url: Option<String>,

    /// Delivery timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

/// Channel store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot of channel statuses, loaded at startup and saved on shutdown.
    pub snapshot_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "channel_relay=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Placeholder admin key shipped in the defaults.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the `/admin` API.
    pub enabled: bool,

    /// Bearer token required by the admin API.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
        }
    }
}

impl AdminConfig {
    /// The admin API is mounted but still guarded by the shipped placeholder.
    pub fn uses_placeholder_key(&self) -> bool {
        self.enabled && self.api_key == PLACEHOLDER_ADMIN_KEY
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Public base URL used to build gateway callback URLs.
    pub public_base_url: String,

    /// Configured gateway instances.
    pub gateways: Vec<GatewaySettings>,
}

/// One configured payment gateway instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Instance name, used in callback URLs (`/payments/{name}/callback`).
    pub name: String,

    /// Registry key of the implementation (e.g. "stripe").
    pub kind: String,

    /// Gateway-specific settings, opaque to the relay.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl PaymentsConfig {
    /// Look up a configured gateway instance by name.
    pub fn gateway(&self, name: &str) -> Option<&GatewaySettings> {
        self.gateways.iter().find(|g| g.name == name)
    }

    /// Callback URL advertised to the gateway for `name`.
    pub fn notify_url(&self, name: &str) -> String {
        format!(
            "{}/payments/{}/callback",
            self.public_base_url.trim_end_matches('/'),
            name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert!(!config.channel_health.automatic_disable);
        assert!(!config.channel_health.automatic_enable);
        assert_eq!(config.channel_health.forbidden_disables, vec![ChannelType::Gemini]);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_parse_channels_and_policy() {
        let raw = r#"
            [channel_health]
            automatic_disable = true
            automatic_enable = true
            forbidden_disables = ["gemini", "anthropic"]

            [[channels]]
            id = 1
            name = "primary"
            type = "open_ai"

            [[channels]]
            id = 2
            name = "backup"
            type = "gemini"
            status = "manually_disabled"
        "#;
        let config: RelayConfig = toml::from_str(raw).unwrap();
        assert!(config.channel_health.automatic_disable);
        assert_eq!(config.channel_health.forbidden_disables.len(), 2);
        assert_eq!(config.channels[0].status, ChannelStatus::Enabled);
        assert_eq!(config.channels[1].channel_type, ChannelType::Gemini);
        assert_eq!(config.channels[1].status, ChannelStatus::ManuallyDisabled);
    }

    #[test]
    fn test_placeholder_admin_key() {
        let mut admin = AdminConfig::default();
        assert!(admin.uses_placeholder_key());

        admin.enabled = false;
        assert!(!admin.uses_placeholder_key());

        let config: RelayConfig = toml::from_str("[admin]\napi_key = \"s3cret\"").unwrap();
        assert!(!config.admin.uses_placeholder_key());
    }

    #[test]
    fn test_notify_url() {
        let payments = PaymentsConfig {
            public_base_url: "https://relay.example.com/".into(),
            gateways: Vec::new(),
        };
        assert_eq!(
            payments.notify_url("stripe-main"),
            "https://relay.example.com/payments/stripe-main/callback"
        );
    }
}
