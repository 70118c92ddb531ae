//! Channel record and its enums.

use serde::{Deserialize, Serialize};

use crate::config::schema::ChannelConfig;

/// Upstream provider family of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    OpenAi,
    Azure,
    Anthropic,
    Gemini,
    Mistral,
    Generic,
}

/// Routing status of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Enabled,
    /// Disabled by the relay after a fatal upstream failure.
    AutoDisabled,
    /// Disabled by an operator. Never reversed automatically.
    ManuallyDisabled,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Enabled => "enabled",
            ChannelStatus::AutoDisabled => "auto_disabled",
            ChannelStatus::ManuallyDisabled => "manually_disabled",
        }
    }
}

/// A configured route to one upstream provider credential/endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: i64,
    pub name: String,
    pub channel_type: ChannelType,
    pub status: ChannelStatus,
}

impl ChannelRecord {
    pub fn new(id: i64, name: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            id,
            name: name.into(),
            channel_type,
            status: ChannelStatus::Enabled,
        }
    }

    /// Builder-style status override.
    pub fn with_status(mut self, status: ChannelStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the channel is in active rotation.
    pub fn is_enabled(&self) -> bool {
        self.status == ChannelStatus::Enabled
    }
}

impl From<&ChannelConfig> for ChannelRecord {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            channel_type: config.channel_type,
            status: config.status,
        }
    }
}
