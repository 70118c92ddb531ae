//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, timeouts)
//! - Keep the live configuration swappable at runtime
//! - Bind server to listener and shut down gracefully
//! - Save the channel snapshot on exit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, Uri},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::channel::{InMemoryChannelStore, StoreError};
use crate::config::RelayConfig;
use crate::health::LifecycleController;
use crate::http::callback::payment_callback;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::relay_not_found;
use crate::notify::{build_notifier, Notifier};
use crate::observability::metrics;
use crate::payments::GatewayRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration; read per request, swapped on reload.
    pub config: Arc<ArcSwap<RelayConfig>>,
    pub store: Arc<InMemoryChannelStore>,
    pub lifecycle: Arc<LifecycleController>,
    pub gateways: Arc<GatewayRegistry>,
    pub request_count: Arc<AtomicUsize>,
}

impl AppState {
    /// Build state from configuration and the given collaborators.
    pub fn new(
        config: RelayConfig,
        notifier: Arc<dyn Notifier>,
        gateways: GatewayRegistry,
    ) -> Result<Self, StoreError> {
        let store = Arc::new(InMemoryChannelStore::from_config(
            &config.channels,
            config.store.snapshot_path.clone(),
        )?);
        let lifecycle = Arc::new(LifecycleController::new(store.clone(), notifier));

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            store,
            lifecycle,
            gateways: Arc::new(gateways),
            request_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

/// HTTP server for the channel relay.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, StoreError> {
        let notifier = build_notifier(&config.notify);
        let state = AppState::new(config, notifier, GatewayRegistry::with_defaults())?;
        Ok(Self::with_state(state))
    }

    /// Create a server around prebuilt state.
    pub fn with_state(state: AppState) -> Self {
        let router = build_router(&state);
        Self { router, state }
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the live config.
    /// Listener, admin mount and channel list only change on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let payments = self.state.config.load().payments.clone();
        self.state.gateways.announce(&payments).await;

        let live = self.state.config.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    automatic_disable = new_config.channel_health.automatic_disable,
                    automatic_enable = new_config.channel_health.automatic_enable,
                    "Configuration reloaded"
                );
                live.store(Arc::new(new_config));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        if let Err(e) = self.state.store.save_to_file() {
            tracing::error!(error = %e, "Failed to save channel snapshot");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: &AppState) -> Router {
    let config = state.config.load();

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/payments/{name}/callback", post(payment_callback));

    if config.admin.enabled {
        router = router.merge(setup_admin_router(state.clone()));
    }

    router
        .fallback(not_found_handler)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler(method: Method, uri: Uri) -> Response {
    relay_not_found(&method, uri.path())
}

async fn track_requests(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let request_id = request.request_id().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    metrics::record_request(status.as_u16());
    if status.is_client_error() || status.is_server_error() {
        tracing::debug!(request_id = %request_id, path = %path, status = %status, "Request failed");
    }
    response
}
