//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_http_requests_total` (counter): requests by status
//! - `relay_channel_decisions_total` (counter): classifier decisions by action
//! - `relay_channel_transitions_total` (counter): status writes by target status
//! - `relay_notifications_total` (counter): notifications by sink and result
//! - `relay_payment_callbacks_total` (counter): gateway callbacks by gateway and result

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16) {
    counter!("relay_http_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_decision(action: &'static str) {
    counter!("relay_channel_decisions_total", "action" => action).increment(1);
}

pub fn record_transition(status: &'static str) {
    counter!("relay_channel_transitions_total", "status" => status).increment(1);
}

pub fn record_notification(sink: &'static str, result: &'static str) {
    counter!("relay_notifications_total", "sink" => sink, "result" => result).increment(1);
}

pub fn record_payment_callback(gateway: &str, result: &'static str) {
    counter!(
        "relay_payment_callbacks_total",
        "gateway" => gateway.to_string(),
        "result" => result
    )
    .increment(1);
}
