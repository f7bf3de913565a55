//! Integration tests for the credential lifecycle
//!
//! Run with a real database:
//! ```sh
//! TEST_DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

mod common;

use axum::http::StatusCode;
use common::{set_cookie_value, TestApp};
use serde_json::json;

fn signup_body(name: &str, email: &str, password: &str) -> String {
    json!({
        "fullName": name,
        "email": email,
        "password": password,
        "passwordConfirm": password
    })
    .to_string()
}

fn login_body(email: &str, password: &str) -> String {
    json!({ "email": email, "password": password }).to_string()
}

fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_signup_sends_verification_link() {
    let app = TestApp::new().await;
    let email = unique_email("signup");

    let (status, body) = app
        .post(
            "/api/v1/users/signup",
            &signup_body("Ann Lee", &email, "longpassword1"),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("verification link"));
    assert!(app.mailer.last_verification_code().is_some());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_signup_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let email = unique_email("duplicate");

    let (status, _) = app
        .post(
            "/api/v1/users/signup",
            &signup_body("Ann Lee", &email, "longpassword1"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same address, case-folded: still a conflict
    let (status, _) = app
        .post(
            "/api/v1/users/signup",
            &signup_body("Ann Lee", &email.to_uppercase(), "longpassword1"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_before_verification_is_forbidden() {
    let app = TestApp::new().await;
    let email = unique_email("unverified");

    app.post(
        "/api/v1/users/signup",
        &signup_body("Ann Lee", &email, "longpassword1"),
    )
    .await;

    let (status, body) = app
        .post("/api/v1/users/login", &login_body(&email, "longpassword1"))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("verify your email"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_full_lifecycle_signup_verify_login_me_refresh_logout() {
    let app = TestApp::new().await;
    let email = unique_email("lifecycle");

    // Signup
    let (status, _) = app
        .post(
            "/api/v1/users/signup",
            &signup_body("Ann Lee", &email, "longpassword1"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Verify with the emailed code
    let code = app.mailer.last_verification_code().unwrap();
    let (status, _) = app
        .get(&format!("/api/v1/users/verification/{}", code))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The code is single use
    let (status, _) = app
        .get(&format!("/api/v1/users/verification/{}", code))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Login sets both token cookies and returns the access token
    let (status, headers, body) = app
        .request_full(
            "POST",
            "/api/v1/users/login",
            Some(&login_body(&email, "longpassword1")),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access_cookie = set_cookie_value(&headers, "access_token").unwrap();
    let refresh_cookie = set_cookie_value(&headers, "refresh_token").unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["access_token"].as_str().unwrap(), access_cookie);

    // /me with the bearer token
    let (status, body) = app
        .request(
            "GET",
            "/api/v1/users/me",
            None,
            &[("Authorization", &format!("Bearer {}", access_cookie))],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["user"]["email"].as_str().unwrap(), email);
    assert_eq!(json["data"]["user"]["role"].as_str().unwrap(), "user");

    // Refresh mints a new access token and a readable logged_in marker
    let (status, headers, _) = app
        .request_full(
            "POST",
            "/api/v1/users/refresh",
            None,
            &[("Cookie", &format!("refresh_token={}", refresh_cookie))],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie_value(&headers, "access_token").is_some());
    assert_eq!(
        set_cookie_value(&headers, "logged_in").as_deref(),
        Some("true")
    );

    // Logout revokes the session; the still-valid token no longer works
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/users/logout",
            None,
            &[("Authorization", &format!("Bearer {}", access_cookie))],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "GET",
            "/api/v1/users/me",
            None,
            &[("Authorization", &format!("Bearer {}", access_cookie))],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // And the refresh token is dead too
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/users/refresh",
            None,
            &[("Cookie", &format!("refresh_token={}", refresh_cookie))],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let email = unique_email("wrongpass");

    app.post(
        "/api/v1/users/signup",
        &signup_body("Ann Lee", &email, "longpassword1"),
    )
    .await;
    let code = app.mailer.last_verification_code().unwrap();
    app.get(&format!("/api/v1/users/verification/{}", code))
        .await;

    let (status, body) = app
        .post("/api/v1/users/login", &login_body(&email, "wrongpassword"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Identical wording for bad password and unknown user
    assert!(body.contains("Incorrect email or password"));

    let (status, unknown_body) = app
        .post(
            "/api/v1/users/login",
            &login_body(&unique_email("ghost"), "longpassword1"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(unknown_body.contains("Incorrect email or password"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_password_reset_flow_revokes_session() {
    let app = TestApp::new().await;
    let email = unique_email("reset");

    // Signup + verify + login
    app.post(
        "/api/v1/users/signup",
        &signup_body("Ann Lee", &email, "longpassword1"),
    )
    .await;
    let code = app.mailer.last_verification_code().unwrap();
    app.get(&format!("/api/v1/users/verification/{}", code))
        .await;
    let (status, headers, _) = app
        .request_full(
            "POST",
            "/api/v1/users/login",
            Some(&login_body(&email, "longpassword1")),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = set_cookie_value(&headers, "access_token").unwrap();

    // Request a reset link
    let (status, _) = app
        .post(
            "/api/v1/users/forgotPassword",
            &json!({ "email": email }).to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset_code = app.mailer.last_reset_code().unwrap();

    // Apply the new password
    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/v1/users/resetPassword/{}", reset_code),
            Some(
                &json!({ "password": "newpassword1", "passwordConfirm": "newpassword1" })
                    .to_string(),
            ),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // The reset code is single use
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/v1/users/resetPassword/{}", reset_code),
            Some(
                &json!({ "password": "newpassword1", "passwordConfirm": "newpassword1" })
                    .to_string(),
            ),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("invalid or has expired"));

    // The pre-reset session is revoked
    let (status, _) = app
        .request(
            "GET",
            "/api/v1/users/me",
            None,
            &[("Authorization", &format!("Bearer {}", access_token))],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Old password no longer works, the new one does
    let (status, _) = app
        .post("/api/v1/users/login", &login_body(&email, "longpassword1"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post("/api/v1/users/login", &login_body(&email, "newpassword1"))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_forgot_password_unknown_email_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/users/forgotPassword",
            &json!({ "email": unique_email("nobody") }).to_string(),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("no user with that email"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_role_gate_rejects_regular_user_on_admin_route() {
    let app = TestApp::new().await;
    let email = unique_email("rbac");

    app.post(
        "/api/v1/users/signup",
        &signup_body("Ann Lee", &email, "longpassword1"),
    )
    .await;
    let code = app.mailer.last_verification_code().unwrap();
    app.get(&format!("/api/v1/users/verification/{}", code))
        .await;
    let (_, headers, _) = app
        .request_full(
            "POST",
            "/api/v1/users/login",
            Some(&login_body(&email, "longpassword1")),
            &[],
        )
        .await;
    let token = set_cookie_value(&headers, "access_token").unwrap();
    let auth = format!("Bearer {}", token);

    let (status, _) = app
        .request("GET", "/api/v1/users/user", None, &[("Authorization", &auth)])
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            "GET",
            "/api/v1/users/admin",
            None,
            &[("Authorization", &auth)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("permission"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("healthy"));

    let (status, _) = app.get("/health/live").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("database"));
}
