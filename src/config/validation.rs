//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (unique channel ids, gateway names)
//! - Validate addresses and URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("duplicate channel id {0}")]
    DuplicateChannel(i64),

    #[error("channel {0} has an empty name")]
    EmptyChannelName(i64),

    #[error("invalid notify webhook url '{0}'")]
    WebhookUrl(String),

    #[error("admin api is enabled but admin.api_key is empty")]
    EmptyAdminKey,

    #[error("duplicate payment gateway '{0}'")]
    DuplicateGateway(String),

    #[error("payment gateway entry has an empty name")]
    EmptyGatewayName,

    #[error("invalid payments.public_base_url '{0}'")]
    PublicBaseUrl(String),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut ids = HashSet::new();
    for channel in &config.channels {
        if !ids.insert(channel.id) {
            errors.push(ValidationError::DuplicateChannel(channel.id));
        }
        if channel.name.trim().is_empty() {
            errors.push(ValidationError::EmptyChannelName(channel.id));
        }
    }

    if let Some(webhook) = &config.notify.webhook_url {
        if Url::parse(webhook).is_err() {
            errors.push(ValidationError::WebhookUrl(webhook.clone()));
        }
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }

    let mut names = HashSet::new();
    for gateway in &config.payments.gateways {
        if gateway.name.is_empty() {
            errors.push(ValidationError::EmptyGatewayName);
        } else if !names.insert(gateway.name.as_str()) {
            errors.push(ValidationError::DuplicateGateway(gateway.name.clone()));
        }
    }
    if !config.payments.gateways.is_empty() && Url::parse(&config.payments.public_base_url).is_err() {
        errors.push(ValidationError::PublicBaseUrl(
            config.payments.public_base_url.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
