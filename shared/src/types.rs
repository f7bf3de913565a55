//! API request and response types

use crate::models::UserRole;
use crate::validation::validate_full_name;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request
///
/// Field names follow the public API contract (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = 255, message = "Full name is required"),
        custom(function = "validate_full_name")
    )]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 32,
        message = "Password must be between 8 and 32 characters"
    ))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub password_confirm: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 32,
        message = "Password must be between 8 and 32 characters"
    ))]
    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub email: String,
}

/// Reset-password request (the reset code travels in the URL path)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(
        min = 8,
        max = 32,
        message = "Password must be between 8 and 32 characters"
    ))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub password_confirm: String,
}

/// Generic success envelope for operations without a payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Login and refresh response carrying the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub status: String,
    pub access_token: String,
}

/// Public view of an account, returned by `/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Envelope for `/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub status: String,
    pub data: UserData,
}

/// Data payload wrapping the user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub user: UserProfile,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(password: &str, confirm: &str) -> SignupRequest {
        SignupRequest {
            full_name: "Ann Lee".to_string(),
            email: "a@x.com".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    #[test]
    fn test_signup_request_valid() {
        assert!(signup("longpass1", "longpass1").validate().is_ok());
    }

    #[test]
    fn test_signup_request_password_mismatch() {
        let err = signup("longpass1", "longpass2").validate().unwrap_err();
        assert!(err.field_errors().contains_key("password_confirm"));
    }

    #[test]
    fn test_signup_request_short_password() {
        let err = signup("short", "short").validate().unwrap_err();
        assert!(err.field_errors().contains_key("password"));
    }

    #[test]
    fn test_signup_request_camel_case_wire_format() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"fullName":"Ann Lee","email":"a@x.com","password":"longpass1","passwordConfirm":"longpass1"}"#,
        )
        .unwrap();
        assert_eq!(req.full_name, "Ann Lee");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_request_rejects_bad_email() {
        let req = LoginRequest {
            email: "not-an-email".to_string(),
            password: "longpass1".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
