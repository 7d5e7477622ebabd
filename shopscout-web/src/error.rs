//! JSON error responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shopscout_core::AuthError;

/// Error returned by any handler, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad client input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or rejected credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Server-side failure (500); details are logged, not returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn unauthorized(message: &str) -> Self {
        ApiError::Unauthorized(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingField | AuthError::EmailTaken => {
                ApiError::BadRequest(error.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::Unauthorized(error.to_string())
            }
            other => {
                tracing::error!(error = %other, "Auth request failed");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        let hashing = AuthError::Hashing {
            reason: "cost out of range".to_string(),
        };
        assert!(matches!(ApiError::from(hashing), ApiError::Internal));
    }

    #[test]
    fn test_internal_error_hides_details() {
        assert_eq!(ApiError::Internal.to_string(), "internal server error");
        assert_eq!(
            ApiError::from(AuthError::MissingField).to_string(),
            "email and password required"
        );
    }
}
