//! Authenticated user routes

use crate::auth::{rbac, CurrentUser};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{routing::get, Json, Router};
use gatehouse_shared::models::UserRole;
use gatehouse_shared::types::{CurrentUserResponse, StatusResponse, UserData};

/// Create authenticated user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_user))
        .route("/user", get(user_only))
        .route("/admin", get(admin_only))
}

/// Return the authenticated principal
///
/// GET /api/v1/users/me
async fn current_user(user: CurrentUser) -> ApiResult<Json<CurrentUserResponse>> {
    Ok(Json(CurrentUserResponse {
        status: "success".to_string(),
        data: UserData {
            user: user.profile(),
        },
    }))
}

/// Role-gated endpoint for regular users
///
/// GET /api/v1/users/user
async fn user_only(user: CurrentUser) -> ApiResult<Json<StatusResponse>> {
    rbac::authorize(Some(&user), &[UserRole::User])?;

    Ok(Json(StatusResponse::success(
        "You see this because you are an user",
    )))
}

/// Role-gated endpoint for admins
///
/// GET /api/v1/users/admin
async fn admin_only(user: CurrentUser) -> ApiResult<Json<StatusResponse>> {
    rbac::authorize(Some(&user), &[UserRole::Admin])?;

    Ok(Json(StatusResponse::success(
        "You see this because you are an admin",
    )))
}
