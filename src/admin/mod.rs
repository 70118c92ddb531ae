pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes, guarded by bearer-token auth.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/channels", get(get_channels))
        .route("/admin/channels/{id}", get(get_channel))
        .route("/admin/channels/{id}/outcome", post(report_outcome))
        .route("/admin/channels/{id}/status", post(set_status))
        .route("/admin/payments/gateways", get(get_gateways))
        .route("/admin/payments/{name}/pay", post(create_payment))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
