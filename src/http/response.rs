//! Error envelope shared by every error the relay produces itself.
//!
//! # Shape
//! ```text
//! {"error": {"message": "...", "type": "...", "param": "", "code": ""}}
//! ```
//! Upstream errors are passed through untouched; this envelope is only for
//! failures that originate in the relay.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of the `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: String,
    pub code: String,
}

/// Top-level error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                error_type: error_type.into(),
                param: String::new(),
                code: String::new(),
            },
        }
    }
}

/// Build an error response with the standard envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>, error_type: &str) -> Response {
    (status, Json(ErrorEnvelope::new(message, error_type))).into_response()
}

/// Envelope for a request that matched no route.
pub fn not_found_envelope(method: &Method, path: &str) -> ErrorEnvelope {
    ErrorEnvelope::new(
        format!("Invalid URL ({} {})", method, path),
        "invalid_request_error",
    )
}

/// Response for a request that matched no route.
pub fn relay_not_found(method: &Method, path: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(not_found_envelope(method, path))).into_response()
}
