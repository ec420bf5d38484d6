//! Error shape for backend calls.
//!
//! Every failed call is normalized to one of two cases: the request never
//! produced a response, or the backend answered with a non-2xx status. The
//! status case always carries the HTTP status and the backend's own message
//! so pages can surface it verbatim.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the backend (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status {
        status: StatusCode,
        message: String,
        /// Raw error body, when the backend sent JSON.
        payload: Option<Value>,
    },
}

impl ApiError {
    /// Build the status case from a response's status and parsed body.
    pub(crate) fn from_response(status: StatusCode, payload: Option<Value>) -> Self {
        let message = payload
            .as_ref()
            .and_then(backend_message)
            .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
        ApiError::Status {
            status,
            message,
            payload,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// The backend puts the human-readable reason under `message`; a few older
/// endpoints use `error` instead.
fn backend_message(payload: &Value) -> Option<String> {
    for key in ["message", "error"] {
        if let Some(text) = payload.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_field_wins() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            Some(json!({ "message": "Email is required", "error": "ignored" })),
        );
        assert_eq!(err.to_string(), "Email is required");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_error_field_fallback() {
        let err = ApiError::from_response(
            StatusCode::CONFLICT,
            Some(json!({ "error": "Account already exists" })),
        );
        assert_eq!(err.to_string(), "Account already exists");
    }

    #[test]
    fn test_generic_message_when_body_is_unusable() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.to_string(), "Request failed (502)");

        let err = ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(json!({ "message": "" })),
        );
        assert_eq!(err.to_string(), "Request failed (500)");
    }

    #[test]
    fn test_payload_is_kept() {
        let body = json!({ "message": "Validation failed", "fields": ["email"] });
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, Some(body.clone()));
        match err {
            ApiError::Status { payload, .. } => assert_eq!(payload, Some(body)),
            _ => panic!("expected status error"),
        }
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, None);
        assert!(err.is_unauthorized());
        let err = ApiError::from_response(StatusCode::FORBIDDEN, None);
        assert!(!err.is_unauthorized());
    }
}
