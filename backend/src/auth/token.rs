//! Signed token issuance and verification
//!
//! Access and refresh tokens are RS256-signed over `{sub, iat, exp}` with
//! independent key pairs and TTLs, so a token of one kind never verifies
//! against the other kind's key. Signing uses the private half; verification
//! needs only the public half, which other services may hold.

use crate::config::TokenConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use secrecy::ExposeSecret;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Token kind, each with its own key pair and TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// One kind's pre-parsed keys plus its TTL
#[derive(Clone)]
struct KeyPair {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl_secs: i64,
}

impl KeyPair {
    fn from_pems(private_pem: &str, public_pem: &str, ttl_mins: i64) -> Result<Self> {
        Ok(Self {
            encoding: Arc::new(
                EncodingKey::from_rsa_pem(private_pem.as_bytes())
                    .context("invalid RSA private key PEM")?,
            ),
            decoding: Arc::new(
                DecodingKey::from_rsa_pem(public_pem.as_bytes())
                    .context("invalid RSA public key PEM")?,
            ),
            ttl_secs: ttl_mins * 60,
        })
    }
}

/// Token service with pre-parsed keys
///
/// Parsing RSA PEMs is expensive; construct once at startup and clone freely
/// (keys are behind Arc).
#[derive(Clone)]
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenService {
    /// Build the service from configured PEM key pairs
    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        Ok(Self {
            access: KeyPair::from_pems(
                config.access_private_key.expose_secret(),
                &config.access_public_key,
                config.access_expires_mins,
            )
            .context("access token keys")?,
            refresh: KeyPair::from_pems(
                config.refresh_private_key.expose_secret(),
                &config.refresh_public_key,
                config.refresh_expires_mins,
            )
            .context("refresh token keys")?,
        })
    }

    fn key_pair(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign a token of the given kind for a user
    pub fn sign(&self, user_id: Uuid, kind: TokenKind) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.key_pair(kind).ttl_secs,
        };
        self.sign_claims(&claims, kind)
    }

    fn sign_claims(&self, claims: &Claims, kind: TokenKind) -> Result<String> {
        encode(
            &Header::new(Algorithm::RS256),
            claims,
            &self.key_pair(kind).encoding,
        )
        .context("failed to sign token")
    }

    /// Verify a token of the given kind
    ///
    /// Returns `None` on any failure (malformed, wrong key, expired,
    /// tampered) rather than an error; callers decide what absence means.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        let validation = Validation::new(Algorithm::RS256);
        decode::<Claims>(token, &self.key_pair(kind).decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// TTL in seconds for the given kind (drives cookie Max-Age)
    pub fn ttl_secs(&self, kind: TokenKind) -> i64 {
        self.key_pair(kind).ttl_secs
    }
}
