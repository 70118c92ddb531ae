//! Stripe Checkout gateway.
//!
//! # Responsibilities
//! - Create Checkout Sessions for relay orders
//! - Verify `Stripe-Signature` on webhook callbacks
//! - Map `checkout.session.completed` events to `PayNotify`

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::config::GatewaySettings;
use crate::payments::gateway::{
    CallbackRequest, PayMethod, PayNotify, PayOrder, PayRequest, PaymentError, PaymentGateway,
};

/// Maximum age of a signed callback, in seconds.
const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Settings stored in `GatewaySettings::config` for a Stripe instance.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

impl StripeConfig {
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, PaymentError> {
        let config: Self = serde_json::from_value(settings.config.clone())
            .map_err(|e| PaymentError::InvalidConfig(format!("{}: {}", settings.name, e)))?;
        if config.secret_key.is_empty() || config.webhook_secret.is_empty() {
            return Err(PaymentError::InvalidConfig(format!(
                "{}: secret_key and webhook_secret are required",
                settings.name
            )));
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
}

pub struct StripeGateway {
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for StripeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn pay(&self, order: &PayOrder, settings: &GatewaySettings) -> Result<PayRequest, PaymentError> {
        let config = StripeConfig::from_settings(settings)?;
        let amount = order.amount.to_string();
        let currency = order.currency.to_lowercase();

        let form = [
            ("mode", "payment"),
            ("success_url", order.return_url.as_str()),
            ("cancel_url", order.return_url.as_str()),
            ("client_reference_id", order.trade_no.as_str()),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", currency.as_str()),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][price_data][product_data][name]", order.description.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", config.api_base.trim_end_matches('/')))
            .bearer_auth(&config.secret_key)
            .form(&form[..])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Upstream(format!("{}: {}", status, text)));
        }

        let session: CheckoutSession = response.json().await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::Upstream("checkout session has no url".into()))?;

        tracing::info!(trade_no = %order.trade_no, session = %session.id, "Stripe checkout session created");
        Ok(PayRequest {
            method: PayMethod::Redirect,
            url,
            gateway_no: Some(session.id),
        })
    }

    async fn created_pay(&self, notify_url: &str, settings: &GatewaySettings) -> Result<(), PaymentError> {
        StripeConfig::from_settings(settings)?;
        // The webhook endpoint is registered in the Stripe dashboard.
        tracing::info!(
            gateway = %settings.name,
            notify_url = %notify_url,
            "Stripe webhook endpoint must point at notify_url"
        );
        Ok(())
    }

    async fn handle_callback(
        &self,
        request: &CallbackRequest,
        settings: &GatewaySettings,
    ) -> Result<PayNotify, PaymentError> {
        let config = StripeConfig::from_settings(settings)?;
        let header = request
            .header("stripe-signature")
            .ok_or(PaymentError::Signature)?;

        verify_signature(header, &request.body, &config.webhook_secret, unix_now())?;
        parse_event(&request.body)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Verify a `t=<ts>,v1=<hex>[,v1=<hex>...]` signature header.
pub fn verify_signature(header: &str, body: &str, secret: &str, now: u64) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<u64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::Signature)?;
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::Signature);
    }

    let signed_payload = format!("{}.{}", timestamp, body);
    for signature in signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| PaymentError::Signature)?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }
    Err(PaymentError::Signature)
}

fn parse_event(body: &str) -> Result<PayNotify, PaymentError> {
    let event: Value =
        serde_json::from_str(body).map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

    let event_type = event["type"].as_str().unwrap_or_default();
    if event_type != "checkout.session.completed" {
        return Err(PaymentError::Ignored(format!("event type '{}'", event_type)));
    }

    let session = &event["data"]["object"];
    if session["payment_status"].as_str() != Some("paid") {
        return Err(PaymentError::Ignored("session not paid".into()));
    }

    let trade_no = session["client_reference_id"]
        .as_str()
        .ok_or_else(|| PaymentError::InvalidPayload("missing client_reference_id".into()))?;
    let gateway_no = session["id"]
        .as_str()
        .ok_or_else(|| PaymentError::InvalidPayload("missing session id".into()))?;

    Ok(PayNotify {
        trade_no: trade_no.to_string(),
        gateway_no: gateway_no.to_string(),
    })
}
