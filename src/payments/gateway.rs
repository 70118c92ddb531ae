//! Payment gateway capability set.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GatewaySettings;

/// Errors raised by a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("unknown payment gateway '{0}'")]
    UnknownGateway(String),

    #[error("invalid gateway config: {0}")]
    InvalidConfig(String),

    #[error("callback signature verification failed")]
    Signature,

    #[error("invalid callback payload: {0}")]
    InvalidPayload(String),

    /// A well-formed callback that carries no completed payment.
    #[error("callback ignored: {0}")]
    Ignored(String),

    #[error("gateway returned an error: {0}")]
    Upstream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// An order to be paid through a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayOrder {
    /// Relay-side order number, echoed back by the callback.
    pub trade_no: String,
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub currency: String,
    pub description: String,
    /// Where the payer lands after finishing or cancelling.
    pub return_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayMethod {
    Redirect,
    QrCode,
}

/// What the payer needs to do next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    pub method: PayMethod,
    pub url: String,
    /// Gateway-side reference, when the gateway issues one up front.
    pub gateway_no: Option<String>,
}

/// A confirmed payment extracted from a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayNotify {
    pub trade_no: String,
    pub gateway_no: String,
}

/// Framework-independent view of an inbound callback request.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: String,
}

impl CallbackRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// One interchangeable payment gateway implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registry key, matched against `GatewaySettings::kind`.
    fn name(&self) -> &'static str;

    /// Start a payment for `order`.
    async fn pay(&self, order: &PayOrder, settings: &GatewaySettings) -> Result<PayRequest, PaymentError>;

    /// Called once at startup for every configured instance of this gateway.
    async fn created_pay(&self, notify_url: &str, settings: &GatewaySettings) -> Result<(), PaymentError>;

    /// Verify and decode an asynchronous payment callback.
    async fn handle_callback(
        &self,
        request: &CallbackRequest,
        settings: &GatewaySettings,
    ) -> Result<PayNotify, PaymentError>;
}
