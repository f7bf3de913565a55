//! Application error handling
//!
//! Unified error taxonomy for the API. Each variant maps to one HTTP status;
//! internal causes are logged server-side and never echoed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_shared::types::{ErrorDetail, ErrorResponse};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        /// Offending field name, when a single field can be blamed
        field: Option<String>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing/invalid/expired token or session, or bad credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Unverified account or insufficient role
    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut field = None;
        let (status, code, message) = match &self {
            ApiError::Validation {
                message,
                field: failed_field,
            } => {
                field = failed_field.clone();
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", msg.clone())
            }
            ApiError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR", msg.clone())
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Blame the first failing field; clients get one field at a time
        let detail = errors.field_errors().into_iter().next().map(|(name, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", name));
            (name.to_string(), message)
        });

        match detail {
            Some((name, message)) => ApiError::Validation {
                message,
                field: Some(name),
            },
            None => ApiError::Validation {
                message: errors.to_string(),
                field: None,
            },
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation {
            message: "Invalid input".to_string(),
            field: None,
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_errors_blame_the_failing_field() {
        use gatehouse_shared::types::LoginRequest;
        use validator::Validate;

        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: "longpass1".to_string(),
        };
        let error: ApiError = request.validate().unwrap_err().into();

        match error {
            ApiError::Validation { field, message } => {
                assert_eq!(field.as_deref(), Some("email"));
                assert!(!message.is_empty());
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_authentication_error_status() {
        let error = ApiError::Authentication("Invalid token".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_authorization_error_status() {
        let error = ApiError::Authorization("Insufficient permission".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_conflict_error_status() {
        let error = ApiError::Conflict("Duplicate email".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_validation_response_body_carries_field() {
        let error = ApiError::Validation {
            message: "Invalid email address".to_string(),
            field: Some("email".to_string()),
        };
        let response = error.into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["field"].as_str(), Some("email"));
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::Internal(anyhow::anyhow!("secret database password leaked"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
