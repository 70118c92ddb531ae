use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

use crate::channel::{ChannelRecord, ChannelStatus, ChannelStore};
use crate::health::{Decision, UpstreamError, UpstreamOutcome};
use crate::http::response::error_response;
use crate::http::server::AppState;
use crate::payments::PayOrder;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub total_requests: usize,
    pub channels_enabled: usize,
    pub channels_auto_disabled: usize,
    pub channels_manually_disabled: usize,
    pub automatic_disable: bool,
    pub automatic_enable: bool,
}

#[derive(Serialize)]
pub struct OutcomeReport {
    pub decision: Decision,
    pub channel: ChannelRecord,
}

/// Body of `POST /admin/channels/{id}/outcome`.
///
/// Either a structured outcome or the raw upstream response, which is run
/// through the vendor dialect parser.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReportedOutcome {
    Raw { status_code: u16, body: String },
    Structured(UpstreamOutcome),
}

impl ReportedOutcome {
    pub fn into_outcome(self) -> UpstreamOutcome {
        match self {
            ReportedOutcome::Raw { status_code, .. } if (200..300).contains(&status_code) => {
                UpstreamOutcome::Success
            }
            ReportedOutcome::Raw { status_code, body } => {
                UpstreamError::from_response(status_code, &body).into()
            }
            ReportedOutcome::Structured(outcome) => outcome,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ChannelStatus,
}

#[derive(Serialize)]
pub struct GatewayListing {
    pub kinds: Vec<&'static str>,
    pub configured: Vec<ConfiguredGateway>,
}

#[derive(Serialize)]
pub struct ConfiguredGateway {
    pub name: String,
    pub kind: String,
    pub registered: bool,
    pub notify_url: String,
}

fn channel_not_found(id: i64) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Channel #{} not found", id),
        "invalid_request_error",
    )
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let config = state.config.load();
    let (enabled, auto_disabled, manually_disabled) = state.store.summary();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        total_requests: state.request_count.load(Ordering::Relaxed),
        channels_enabled: enabled,
        channels_auto_disabled: auto_disabled,
        channels_manually_disabled: manually_disabled,
        automatic_disable: config.channel_health.automatic_disable,
        automatic_enable: config.channel_health.automatic_enable,
    })
}

pub async fn get_channels(State(state): State<AppState>) -> Json<Vec<ChannelRecord>> {
    Json(state.store.list())
}

pub async fn get_channel(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.store.get(id) {
        Some(channel) => Json(channel).into_response(),
        None => channel_not_found(id),
    }
}

/// Feed one upstream outcome through the lifecycle controller.
pub async fn report_outcome(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(reported): Json<ReportedOutcome>,
) -> Response {
    let outcome = reported.into_outcome();
    let Some(channel) = state.store.get(id) else {
        return channel_not_found(id);
    };

    let decision = {
        let config = state.config.load();
        state
            .lifecycle
            .on_outcome(&config.channel_health, &channel, &outcome)
    };

    let channel = state.store.get(id).unwrap_or(channel);
    Json(OutcomeReport { decision, channel }).into_response()
}

/// Operator enable / disable.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Response {
    if change.status == ChannelStatus::AutoDisabled {
        return error_response(
            StatusCode::BAD_REQUEST,
            "auto_disabled is reserved for automatic transitions",
            "invalid_request_error",
        );
    }
    let Some(channel) = state.store.get(id) else {
        return channel_not_found(id);
    };

    if let Err(e) = state.lifecycle.apply_manual(&channel, change.status) {
        tracing::error!(channel_id = id, error = %e, "Manual status change failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "server_error");
    }

    let channel = state.store.get(id).unwrap_or(channel);
    Json(channel).into_response()
}

pub async fn get_gateways(State(state): State<AppState>) -> Json<GatewayListing> {
    let config = state.config.load();
    let configured = config
        .payments
        .gateways
        .iter()
        .map(|g| ConfiguredGateway {
            name: g.name.clone(),
            kind: g.kind.clone(),
            registered: state.gateways.get(&g.kind).is_some(),
            notify_url: config.payments.notify_url(&g.name),
        })
        .collect();

    Json(GatewayListing {
        kinds: state.gateways.kinds(),
        configured,
    })
}

/// Start a payment through a configured gateway.
pub async fn create_payment(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(order): Json<PayOrder>,
) -> Response {
    let config = state.config.load_full();
    let (gateway, settings) = match state.gateways.resolve(&config.payments, &name) {
        Ok(found) => found,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string(), "invalid_request_error"),
    };

    match gateway.pay(&order, settings).await {
        Ok(request) => Json(request).into_response(),
        Err(e) => {
            tracing::error!(gateway = %name, trade_no = %order.trade_no, error = %e, "Payment creation failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string(), "upstream_error")
        }
    }
}
