//! User repository for database operations
//!
//! Plain records plus explicit queries; the service layer never holds a live
//! database handle beyond the pool it is given. Every lookup carries the
//! `active = TRUE` predicate explicitly instead of relying on an invisible
//! default filter, and each caller gets the minimal projection it needs.
//! Code matching (verification, reset) is a single atomic
//! UPDATE .. WHERE .. RETURNING so a code transitions state exactly once.

use anyhow::Result;
use chrono::{DateTime, Utc};
use gatehouse_shared::models::UserRole;
use sqlx::PgPool;
use uuid::Uuid;

/// Principal projection: what the auth pipeline attaches to a request
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Login projection: credentials plus the verified gate
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
}

/// Forgot-password projection
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserContact {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    role: String,
}

impl UserRow {
    fn into_record(self) -> Result<UserRecord> {
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(UserRecord {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            role,
        })
    }
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Create a new unverified, active user
    ///
    /// The email must already be lowercased and the password already hashed
    /// by the caller.
    pub async fn create(
        pool: &PgPool,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, email, role
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        row.into_record()
    }

    /// Check if email exists
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }

    /// Find login credentials by lowercased email
    pub async fn find_credentials_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>> {
        let user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, email, password_hash, verified
            FROM users
            WHERE email = $1 AND active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find the contact projection by lowercased email
    pub async fn find_contact_by_email(pool: &PgPool, email: &str) -> Result<Option<UserContact>> {
        let user = sqlx::query_as::<_, UserContact>(
            r#"
            SELECT id, full_name, email, verified
            FROM users
            WHERE email = $1 AND active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Find the principal projection by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, role
            FROM users
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(UserRow::into_record).transpose()
    }

    /// Persist a verification code digest and its expiry
    pub async fn set_verification_code(
        pool: &PgPool,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET verification_code = $2, verification_code_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomically verify the account matching an unexpired code digest
    ///
    /// Returns the user id on success; `None` covers wrong and expired codes
    /// alike. Marks the account verified and clears the code fields so the
    /// same code cannot transition state twice.
    pub async fn verify_email(pool: &PgPool, digest: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET verified = TRUE,
                verification_code = NULL,
                verification_code_expires = NULL,
                updated_at = NOW()
            WHERE verification_code = $1
              AND verification_code_expires > NOW()
              AND active = TRUE
            RETURNING id
            "#,
        )
        .bind(digest)
        .fetch_optional(pool)
        .await?;

        Ok(id)
    }

    /// Persist a password reset code digest and its expiry
    pub async fn set_password_reset_code(
        pool: &PgPool,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_code = $2, password_reset_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Clear the reset fields, e.g. when the reset email could not be sent
    pub async fn clear_password_reset_code(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_code = NULL, password_reset_expires = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomically replace the password for the account matching an unexpired
    /// reset code digest, clearing the reset fields
    ///
    /// Returns the user id so the caller can invalidate the session.
    pub async fn reset_password(
        pool: &PgPool,
        digest: &str,
        password_hash: &str,
    ) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_code = NULL,
                password_reset_expires = NULL,
                updated_at = NOW()
            WHERE password_reset_code = $1
              AND password_reset_expires > NOW()
              AND active = TRUE
            RETURNING id
            "#,
        )
        .bind(digest)
        .bind(password_hash)
        .fetch_optional(pool)
        .await?;

        Ok(id)
    }
}

/// Whether a repository error is a unique-constraint violation (duplicate email)
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
