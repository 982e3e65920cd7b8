//! API error classification.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the token is missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// 404 with the server's message, if any.
    #[error("Not found: {}", .message.as_deref().unwrap_or("resource"))]
    NotFound { message: Option<String> },

    /// 409 with the server's message, if any.
    #[error("Conflict: {}", .message.as_deref().unwrap_or("resource already exists"))]
    Conflict { message: Option<String> },

    /// Any other non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request was superseded by a newer one and its result discarded.
    #[error("Request cancelled")]
    Cancelled,

    /// The endpoint path could not be joined onto the base URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &Value) -> Self {
        let message = server_message(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound { message },
            StatusCode::CONFLICT => Self::Conflict { message },
            _ => Self::Status { status, message },
        }
    }

    /// HTTP status of the response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Conflict { .. } => Some(StatusCode::CONFLICT),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) | Self::Cancelled | Self::InvalidUrl(_) => None,
        }
    }

    /// The server's human-readable error message, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::NotFound { message } | Self::Conflict { message } | Self::Status { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Whether the server answered at all (as opposed to a transport failure).
    #[must_use]
    pub const fn has_response(&self) -> bool {
        self.status().is_some()
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Pull a message out of an error body.
///
/// Handlers disagree on the field name, so `message`, `msg` and `error` are
/// tried in that order.
#[must_use]
pub fn server_message(body: &Value) -> Option<String> {
    ["message", "msg", "error"]
        .iter()
        .filter_map(|key| body.get(key))
        .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classification() {
        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, &json!({"msg": "Token has expired"})),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, &json!({})),
            ApiError::NotFound { message: None }
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::CONFLICT, &json!({"message": "taken"})),
            ApiError::Conflict { message: Some(m) } if m == "taken"
        ));

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, &json!({"error": "Cart is empty"}));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.server_message(), Some("Cart is empty"));
    }

    #[test]
    fn test_server_message_order() {
        assert_eq!(
            server_message(&json!({"error": "e", "message": "m"})).as_deref(),
            Some("m")
        );
        assert_eq!(server_message(&json!({"msg": "  "})), None);
        assert_eq!(server_message(&json!("plain string")), None);
        assert_eq!(server_message(&Value::Null), None);
    }

    #[test]
    fn test_cancelled_has_no_response() {
        assert!(!ApiError::Cancelled.has_response());
        assert!(ApiError::Cancelled.is_cancelled());
    }
}
