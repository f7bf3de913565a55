//! Credential lifecycle orchestration
//!
//! Signup, email verification, login, refresh, forgot/reset password and
//! logout, composed from the hasher, the code generator, the token service,
//! the session store and the user repository. Each step returns an explicit
//! error kind; the HTTP boundary converts exactly once.

use crate::auth::{code, PasswordService, TokenKind};
use crate::cache::SessionPayload;
use crate::error::ApiError;
use crate::repositories::{is_unique_violation, UserRepository};
use crate::state::AppState;
use chrono::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// Generic message for every refresh failure: clients get no hint which
/// link in the chain broke
pub const REFRESH_ERROR: &str = "Failed to refresh access token, please login again.";

/// Access and refresh tokens minted by a login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn verification_code_ttl() -> Duration {
    Duration::hours(24)
}

fn reset_code_ttl() -> Duration {
    Duration::minutes(10)
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Create an unverified account and email a verification link
    ///
    /// The create -> persist-code -> send-email sequence is not
    /// transactional; a partial failure leaves an unverified account behind
    /// and surfaces as an internal error rather than being swallowed.
    pub async fn signup(
        state: &AppState,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let email = email.to_lowercase();

        if UserRepository::email_exists(state.db(), &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "A user with this email address already exists.".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(state.db(), full_name, &email, &password_hash)
            .await
            .map_err(|e| {
                // Lost the race against a concurrent signup for the same email
                if is_unique_violation(&e) {
                    ApiError::Conflict(
                        "A user with this email address already exists.".to_string(),
                    )
                } else {
                    ApiError::Internal(e)
                }
            })?;

        let verify_code = code::generate(verification_code_ttl());
        UserRepository::set_verification_code(
            state.db(),
            user.id,
            &verify_code.digest,
            verify_code.expires_at,
        )
        .await
        .map_err(ApiError::Internal)?;

        let verification_url = format!(
            "{}/api/v1/users/verification/{}",
            state.config().server.origin,
            verify_code.plaintext
        );

        if let Err(e) = state
            .mailer()
            .send_verification(&user.email, &user.full_name, &verification_url)
            .await
        {
            error!(user_id = %user.id, "failed to send verification email: {:?}", e);
            return Err(ApiError::Internal(
                e.context("sending the verification email"),
            ));
        }

        info!(user_id = %user.id, "account created, verification email sent");
        Ok(())
    }

    /// Verify an email address with the plaintext code from the emailed link
    ///
    /// Wrong and expired codes are indistinguishable to the caller.
    pub async fn verify_email(state: &AppState, code_plaintext: &str) -> Result<(), ApiError> {
        let digest = code::digest(code_plaintext);

        let user_id = UserRepository::verify_email(state.db(), &digest)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Authentication("Invalid verification code".to_string()))?;

        info!(user_id = %user_id, "email verified");
        Ok(())
    }

    /// Validate credentials and open a session
    pub async fn login(
        state: &AppState,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, ApiError> {
        let email = email.to_lowercase();

        let user = UserRepository::find_credentials_by_email(state.db(), &email)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::Authentication("Incorrect email or password".to_string())
            })?;

        if !user.verified {
            return Err(ApiError::Authorization("Please verify your email".to_string()));
        }

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash)
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::Authentication(
                "Incorrect email or password".to_string(),
            ));
        }

        Self::sign_tokens(state, user.id, user.email).await
    }

    /// Open (or overwrite) the session and mint the access/refresh pair
    async fn sign_tokens(
        state: &AppState,
        user_id: Uuid,
        email: String,
    ) -> Result<TokenPair, ApiError> {
        let payload = SessionPayload { id: user_id, email };
        state
            .sessions()
            .put(user_id, &payload, state.session_ttl())
            .await
            .map_err(ApiError::Internal)?;

        let access_token = state
            .tokens()
            .sign(user_id, TokenKind::Access)
            .map_err(ApiError::Internal)?;
        let refresh_token = state
            .tokens()
            .sign(user_id, TokenKind::Refresh)
            .map_err(ApiError::Internal)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token backed by a still-live session
    ///
    /// Refresh tokens are not rotated; every missing link yields the same
    /// generic authentication error.
    pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<String, ApiError> {
        let claims = state
            .tokens()
            .verify(refresh_token, TokenKind::Refresh)
            .ok_or_else(|| ApiError::Authentication(REFRESH_ERROR.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Authentication(REFRESH_ERROR.to_string()))?;

        let session = state
            .sessions()
            .get(user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Authentication(REFRESH_ERROR.to_string()))?;

        // Existence check only: a deactivated account cannot refresh
        UserRepository::find_by_id(state.db(), session.id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Authentication(REFRESH_ERROR.to_string()))?;

        state
            .tokens()
            .sign(user_id, TokenKind::Access)
            .map_err(ApiError::Internal)
    }

    /// Email a password reset link
    pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), ApiError> {
        let email = email.to_lowercase();

        let user = UserRepository::find_contact_by_email(state.db(), &email)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::NotFound("There is no user with that email address.".to_string())
            })?;

        if !user.verified {
            return Err(ApiError::Authorization("Please verify your email".to_string()));
        }

        let reset_code = code::generate(reset_code_ttl());
        UserRepository::set_password_reset_code(
            state.db(),
            user.id,
            &reset_code.digest,
            reset_code.expires_at,
        )
        .await
        .map_err(ApiError::Internal)?;

        let reset_url = format!(
            "{}/api/v1/users/resetPassword/{}",
            state.config().server.origin,
            reset_code.plaintext
        );

        if let Err(e) = state
            .mailer()
            .send_password_reset(&user.email, &user.full_name, &reset_url)
            .await
        {
            // Roll back the persisted code so a failed send leaves no
            // dangling reset window
            if let Err(clear_err) =
                UserRepository::clear_password_reset_code(state.db(), user.id).await
            {
                error!(user_id = %user.id, "failed to clear reset code: {:?}", clear_err);
            }
            error!(user_id = %user.id, "failed to send reset email: {:?}", e);
            return Err(ApiError::Internal(e.context("sending the reset email")));
        }

        info!(user_id = %user.id, "password reset email sent");
        Ok(())
    }

    /// Replace the password proven by an unexpired reset code and revoke the
    /// user's session
    ///
    /// The session delete is mandatory: the credential changed underneath
    /// possibly-live tokens, so they must stop authenticating.
    pub async fn reset_password(
        state: &AppState,
        code_plaintext: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let password_hash = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let digest = code::digest(code_plaintext);
        let user_id = UserRepository::reset_password(state.db(), &digest, &password_hash)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::Authorization("Token is invalid or has expired.".to_string())
            })?;

        state
            .sessions()
            .delete(user_id)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, "password reset, session invalidated");
        Ok(())
    }

    /// Close the principal's session
    ///
    /// The store keeps one session per user, so "logout everywhere" and a
    /// plain logout are the same delete.
    pub async fn logout(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
        state
            .sessions()
            .delete(user_id)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, "logged out");
        Ok(())
    }
}
