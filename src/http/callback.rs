//! Payment gateway callback endpoint.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::response::error_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::payments::{CallbackRequest, PaymentError};

/// `POST /payments/{name}/callback`
pub async fn payment_callback(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let config = state.config.load_full();
    let (gateway, settings) = match state.gateways.resolve(&config.payments, &name) {
        Ok(found) => found,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string(), "invalid_request_error"),
    };

    let request = CallbackRequest {
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        query,
        body,
    };

    match gateway.handle_callback(&request, settings).await {
        Ok(notify) => {
            tracing::info!(
                gateway = %name,
                trade_no = %notify.trade_no,
                gateway_no = %notify.gateway_no,
                "Payment confirmed"
            );
            metrics::record_payment_callback(&name, "paid");
            Json(serde_json::json!({ "received": true, "trade_no": notify.trade_no })).into_response()
        }
        Err(PaymentError::Ignored(reason)) => {
            tracing::debug!(gateway = %name, reason = %reason, "Payment callback ignored");
            metrics::record_payment_callback(&name, "ignored");
            Json(serde_json::json!({ "received": true })).into_response()
        }
        Err(e) => {
            tracing::warn!(gateway = %name, error = %e, "Payment callback rejected");
            metrics::record_payment_callback(&name, "rejected");
            error_response(StatusCode::BAD_REQUEST, e.to_string(), "invalid_request_error")
        }
    }
}
