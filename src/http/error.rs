//! Request dispatch errors and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::handlers::HandlerError;

/// Why a request did not reach, or did not return from, its handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Cannot {method} {path}")]
    NotFound { method: String, path: String },

    #[error("unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("invalid JSON body: {0}")]
    InvalidBody(serde_json::Error),

    #[error("no token authorizer configured")]
    AuthorizerUnavailable,

    #[error("handler failed: {0}")]
    Handler(HandlerError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Unauthorized(e) if e.is_rejection() => StatusCode::UNAUTHORIZED,
            DispatchError::Unauthorized(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::AuthorizerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Internal failures are not described.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = DispatchError::NotFound {
            method: "GET".into(),
            path: "/nope".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.public_message(), "Cannot GET /nope");

        let unauthorized = DispatchError::Unauthorized(AuthError::MissingToken);
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.public_message(), "Unauthorized");

        let too_large = DispatchError::PayloadTooLarge { limit: 10 };
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let handler = DispatchError::Handler("boom".into());
        assert_eq!(handler.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(handler.public_message(), "Internal server error");
    }

    #[test]
    fn test_invalid_body_is_bad_request() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert_eq!(DispatchError::InvalidBody(err).status(), StatusCode::BAD_REQUEST);
    }
}
