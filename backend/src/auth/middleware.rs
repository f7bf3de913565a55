//! Authentication pipeline
//!
//! The `CurrentUser` extractor walks the full chain for protected requests:
//! token extraction (Bearer header, then cookie), signature + expiry check,
//! session liveness in the cache, then a minimal user projection from the
//! repository. A cryptographically valid token whose session is gone (logout,
//! password reset, TTL) does not authenticate. Infrastructure failures are
//! internal errors, never treated as "not authenticated".

use crate::auth::cookie::{extract_cookie, ACCESS_TOKEN_COOKIE};
use crate::auth::token::TokenKind;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use gatehouse_shared::models::UserRole;
use gatehouse_shared::types::UserProfile;
use uuid::Uuid;

/// The authenticated principal attached to a request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_string(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Bearer header first, access_token cookie as fallback
        let token = bearer_token(parts)
            .or_else(|| extract_cookie(&parts.headers, ACCESS_TOKEN_COOKIE))
            .ok_or_else(|| ApiError::Authentication("You are not logged in".to_string()))?;

        let claims = app_state
            .tokens()
            .verify(&token, TokenKind::Access)
            .ok_or_else(|| {
                ApiError::Authentication("Invalid token or user doesn't exist".to_string())
            })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Authentication("Invalid token or user doesn't exist".to_string()))?;

        // Session liveness: covers logout and revocation even for tokens
        // that are still cryptographically valid
        let session = app_state
            .sessions()
            .get(user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::Authentication("Invalid token or session expired".to_string())
            })?;

        let user = UserRepository::find_by_id(app_state.db(), session.id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::Authentication("Invalid token or session expired".to_string())
            })?;

        Ok(CurrentUser {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(String::from)
}
