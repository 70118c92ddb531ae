use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::response::error_response;
use crate::http::server::AppState;

/// Require `Authorization: Bearer <admin.api_key>`, checked against the live config.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = {
        let config = state.config.load();
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|key| !config.admin.api_key.is_empty() && key == config.admin.api_key)
    };

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    error_response(
        StatusCode::UNAUTHORIZED,
        "Missing or invalid admin token",
        "authentication_error",
    )
}
