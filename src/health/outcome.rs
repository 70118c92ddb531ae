//! Upstream call outcomes.
//!
//! # Vendor Dialects
//! ```text
//! OpenAI:    {"error": {"message", "type", "param", "code"}}
//! Anthropic: {"type": "error", "error": {"type", "message"}}
//! Gemini:    {"error": {"code": 403, "message", "status"}}
//! ```
//! All three land in the same `UpstreamError` shape. Gemini's integer
//! `code` mirrors the HTTP status and is not a vendor error code; its
//! `status` string is carried as the error type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_RAW_MESSAGE: usize = 512;

/// A failed upstream call, normalized across vendor dialects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamError {
    /// HTTP status returned to the relay (or synthesized for local errors).
    pub status_code: u16,

    /// The failure originated in the local dispatch layer, not the upstream.
    #[serde(default)]
    pub local: bool,

    /// Vendor error code (e.g. `invalid_api_key`).
    #[serde(default)]
    pub code: Option<String>,

    /// Vendor error type (e.g. `insufficient_quota`).
    #[serde(default)]
    pub error_type: Option<String>,

    /// Free-text vendor message.
    #[serde(default)]
    pub message: Option<String>,
}

impl UpstreamError {
    /// An upstream failure with only a status code.
    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// A failure raised by the local dispatch layer.
    pub fn local(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            local: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Build an error from a raw upstream response.
    ///
    /// Bodies that match none of the known dialects keep the raw text
    /// (trimmed and capped) as the message.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let mut error = Self::status(status_code);

        let parsed = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => {
                error.message = raw_message(body);
                return error;
            }
        };

        let Some(inner) = parsed.get("error").and_then(Value::as_object) else {
            // `{"message": "..."}` style bodies from smaller vendors
            error.message = string_field(parsed.get("message")).or_else(|| raw_message(body));
            return error;
        };

        error.message = string_field(inner.get("message"));
        error.error_type =
            string_field(inner.get("type")).or_else(|| string_field(inner.get("status")));
        // Only string codes are vendor codes; numeric ones echo the HTTP status.
        error.code = string_field(inner.get("code"));
        error
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn raw_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_RAW_MESSAGE).collect())
}

/// The result of one proxied call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpstreamOutcome {
    Success,
    Failure(UpstreamError),
}

impl UpstreamOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpstreamOutcome::Success)
    }

    /// The failure payload, if any.
    pub fn error(&self) -> Option<&UpstreamError> {
        match self {
            UpstreamOutcome::Success => None,
            UpstreamOutcome::Failure(err) => Some(err),
        }
    }
}

impl From<UpstreamError> for UpstreamOutcome {
    fn from(err: UpstreamError) -> Self {
        UpstreamOutcome::Failure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_dialect() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#;
        let err = UpstreamError::from_response(401, body);
        assert_eq!(err.status_code, 401);
        assert!(!err.local);
        assert_eq!(err.code.as_deref(), Some("invalid_api_key"));
        assert_eq!(err.error_type.as_deref(), Some("invalid_request_error"));
        assert_eq!(err.message.as_deref(), Some("Incorrect API key provided"));
    }

    #[test]
    fn test_anthropic_dialect() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = UpstreamError::from_response(401, body);
        assert_eq!(err.code, None);
        assert_eq!(err.error_type.as_deref(), Some("authentication_error"));
        assert_eq!(err.message.as_deref(), Some("invalid x-api-key"));
    }

    #[test]
    fn test_gemini_dialect() {
        let body = r#"{"error":{"code":403,"message":"Permission denied on resource project","status":"PERMISSION_DENIED"}}"#;
        let err = UpstreamError::from_response(403, body);
        assert_eq!(err.code, None, "numeric code must not become a vendor code");
        assert_eq!(err.error_type.as_deref(), Some("PERMISSION_DENIED"));
        assert_eq!(err.message.as_deref(), Some("Permission denied on resource project"));
    }

    #[test]
    fn test_unparseable_body_keeps_raw_text() {
        let err = UpstreamError::from_response(502, "  <html>Bad Gateway</html>\n");
        assert_eq!(err.message.as_deref(), Some("<html>Bad Gateway</html>"));

        let long = "x".repeat(2000);
        let err = UpstreamError::from_response(500, &long);
        assert_eq!(err.message.unwrap().len(), MAX_RAW_MESSAGE);

        let err = UpstreamError::from_response(500, "");
        assert_eq!(err.message, None);
    }

    #[test]
    fn test_outcome_tagging() {
        let outcome: UpstreamOutcome = serde_json::from_str(r#"{"outcome":"success"}"#).unwrap();
        assert!(outcome.is_success());

        let outcome: UpstreamOutcome = serde_json::from_str(
            r#"{"outcome":"failure","status_code":429,"message":"slow down"}"#,
        )
        .unwrap();
        let err = outcome.error().unwrap();
        assert_eq!(err.status_code, 429);
        assert!(!err.local);
        assert_eq!(err.code, None);
    }
}
