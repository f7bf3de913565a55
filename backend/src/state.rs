//! Application state management
//!
//! Shared state passed to all request handlers via Axum's state extraction.
//! The session store and mailer are injected as trait objects so tests can
//! substitute in-memory fakes; token keys are parsed once at startup.

use crate::auth::TokenService;
use crate::cache::SessionStore;
use crate::config::AppConfig;
use crate::mailer::Mailer;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
///
/// All fields are cheap to clone: the pool is internally Arc'd, the rest are
/// wrapped in Arc. State is read-only during request handling.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Token service with pre-parsed RSA keys
    pub tokens: TokenService,
    /// Cache-backed session store
    pub sessions: Arc<dyn SessionStore>,
    /// Outbound mail delivery
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Parses the RSA key pairs from the configuration; key parsing is
    /// expensive and must happen once at startup, not per request.
    pub fn new(
        db: PgPool,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
        config: AppConfig,
    ) -> Result<Self> {
        let tokens = TokenService::from_config(&config.token)?;

        Ok(Self {
            db,
            config: Arc::new(config),
            tokens,
            sessions,
            mailer,
        })
    }

    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[inline]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    #[inline]
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// TTL applied to session records in the cache
    #[inline]
    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl()
    }
}
