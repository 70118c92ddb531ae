//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use channel_relay::config::RelayConfig;
use channel_relay::http::HttpServer;
use channel_relay::lifecycle::Shutdown;

pub const ADMIN_KEY: &str = "integration-key";

/// Notifications captured by the mock webhook receiver.
pub type Captured = Arc<Mutex<Vec<Value>>>;

/// Start a webhook receiver that records every JSON body it is sent.
pub async fn start_webhook_receiver(addr: SocketAddr) -> Captured {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/hook", post(record))
        .with_state(captured.clone());

    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    captured
}

async fn record(State(captured): State<Captured>, Json(body): Json<Value>) {
    captured.lock().unwrap().push(body);
}

/// Start the relay on `addr`. Dropping or triggering the returned
/// `Shutdown` stops it.
pub async fn start_relay(config: RelayConfig, addr: SocketAddr) -> Shutdown {
    let (shutdown, _) = start_relay_with_updates(config, addr).await;
    shutdown
}

/// Like [`start_relay`], also returning the sender that feeds live config
/// reloads into the running server.
pub async fn start_relay_with_updates(
    mut config: RelayConfig,
    addr: SocketAddr,
) -> (Shutdown, mpsc::UnboundedSender<RelayConfig>) {
    config.listener.bind_address = addr.to_string();
    config.admin.api_key = ADMIN_KEY.to_string();

    let shutdown = Shutdown::new();
    let (updates_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    (shutdown, updates_tx)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll until `captured` holds at least `n` notifications or the deadline passes.
pub async fn wait_for_notifications(captured: &Captured, n: usize) -> Vec<Value> {
    for _ in 0..50 {
        {
            let seen = captured.lock().unwrap();
            if seen.len() >= n {
                return seen.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    captured.lock().unwrap().clone()
}
