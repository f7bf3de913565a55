//! Credential lifecycle routes
//!
//! Handlers are thin gates: shape validation, the service call, then the
//! response plus cookies. Cookie Max-Age is aligned to the corresponding
//! token TTL, and cookies are Secure in production.

use crate::auth::cookie::{
    append_delete_cookie, append_set_cookie, extract_cookie, CookieConfig, ACCESS_TOKEN_COOKIE,
    LOGGED_IN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::auth::{CurrentUser, TokenKind};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::services::{AuthService, REFRESH_ERROR};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use gatehouse_shared::types::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest, StatusResponse,
    TokenResponse,
};
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

/// Create credential lifecycle routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verification/:token", get(verify_email))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", patch(reset_password))
        .route("/logout", post(logout))
}

/// Register a new account
///
/// POST /api/v1/users/signup
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<StatusResponse>)> {
    req.validate()?;

    AuthService::signup(&state, &req.full_name, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success(
            "A verification link has been sent to your email account.",
        )),
    ))
}

/// Verify an email address
///
/// GET /api/v1/users/verification/{token}
async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    AuthService::verify_email(&state, &token).await?;

    Ok(Json(StatusResponse::success("Email verified successfully")))
}

/// Login with email and password
///
/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let pair = AuthService::login(&state, &req.email, &req.password).await?;

    let secure = AppConfig::is_production();
    let mut headers = HeaderMap::new();
    append_set_cookie(
        &mut headers,
        &CookieConfig::auth(
            ACCESS_TOKEN_COOKIE,
            state.tokens().ttl_secs(TokenKind::Access),
            secure,
        ),
        &pair.access_token,
    );
    append_set_cookie(
        &mut headers,
        &CookieConfig::auth(
            REFRESH_TOKEN_COOKIE,
            state.tokens().ttl_secs(TokenKind::Refresh),
            secure,
        ),
        &pair.refresh_token,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(TokenResponse {
            status: "success".to_string(),
            access_token: pair.access_token,
        }),
    )
        .into_response())
}

/// Mint a new access token from the refresh cookie
///
/// POST /api/v1/users/refresh
async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let refresh_token = extract_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| ApiError::Authentication(REFRESH_ERROR.to_string()))?;

    let access_token = AuthService::refresh(&state, &refresh_token).await?;

    let secure = AppConfig::is_production();
    let access_ttl = state.tokens().ttl_secs(TokenKind::Access);
    let mut response_headers = HeaderMap::new();
    append_set_cookie(
        &mut response_headers,
        &CookieConfig::auth(ACCESS_TOKEN_COOKIE, access_ttl, secure),
        &access_token,
    );
    append_set_cookie(
        &mut response_headers,
        &CookieConfig::readable(LOGGED_IN_COOKIE, access_ttl, secure),
        "true",
    );

    Ok((
        StatusCode::OK,
        response_headers,
        Json(TokenResponse {
            status: "success".to_string(),
            access_token,
        }),
    )
        .into_response())
}

/// Request a password reset link
///
/// POST /api/v1/users/forgotPassword
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<StatusResponse>> {
    req.validate()?;

    AuthService::forgot_password(&state, &req.email).await?;

    Ok(Json(StatusResponse::success(
        "You will receive an email to reset your password.",
    )))
}

/// Reset the password with the emailed code
///
/// PATCH /api/v1/users/resetPassword/{token}
async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    AuthService::reset_password(&state, &token, &req.password).await?;

    // The credential changed: expire the auth cookies along with the session
    let mut headers = HeaderMap::new();
    clear_auth_cookies(&mut headers);

    Ok((
        StatusCode::ACCEPTED,
        headers,
        Json(StatusResponse::success(
            "Your password was successfully updated",
        )),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct LogoutParams {
    #[serde(default)]
    all: bool,
}

/// Close the current session
///
/// POST /api/v1/users/logout[?all=true]
async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<LogoutParams>,
) -> ApiResult<Response> {
    // One session per user: "logout everywhere" is the same delete
    if params.all {
        debug!(user_id = %user.id, "logout all requested");
    }
    AuthService::logout(&state, user.id).await?;

    let mut headers = HeaderMap::new();
    clear_auth_cookies(&mut headers);

    Ok((
        StatusCode::OK,
        headers,
        Json(StatusResponse::success("User successfully logged out")),
    )
        .into_response())
}

fn clear_auth_cookies(headers: &mut HeaderMap) {
    append_delete_cookie(headers, ACCESS_TOKEN_COOKIE);
    append_delete_cookie(headers, REFRESH_TOKEN_COOKIE);
    append_delete_cookie(headers, LOGGED_IN_COOKIE);
}
