//! Gatehouse Backend
//!
//! Credential and session lifecycle service.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling, cookies, and routing
//! - Services: credential lifecycle business logic
//! - Repositories: data access over PostgreSQL with SQLx
//! - Cache: Redis-backed session store

use anyhow::Result;
use gatehouse_backend::{cache::RedisSessionStore, config, db, mailer, routes, state::AppState};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() {
            "production"
        } else {
            "development"
        },
        "Starting Gatehouse Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    // Connect to the database, retrying until it is reachable
    info!("Connecting to database...");
    let db_pool =
        db::connect_with_retry(&config.database.url, config.database.max_connections).await;

    // Run migrations (skip in production if using separate migration job)
    if !config::AppConfig::is_production() {
        db::run_migrations(&db_pool).await?;
    }

    // The session store is the authority for login liveness, so Redis being
    // down is fatal at startup
    info!("Connecting to Redis...");
    let sessions = Arc::new(RedisSessionStore::connect(&config.redis.url).await?);

    let mail = mailer::from_config(&config.mail)?;

    // Create application state
    let state = AppState::new(db_pool, sessions, mail, config.clone())?;

    // Build application
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "gatehouse_backend=info,tower_http=info".into()
        } else {
            "gatehouse_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // All four RSA keys must be provided; there is no baked-in default pair
    if config.token.access_private_key.expose_secret().is_empty()
        || config.token.access_public_key.is_empty()
    {
        errors.push("Access token RSA key pair must be configured");
    }
    if config.token.refresh_private_key.expose_secret().is_empty()
        || config.token.refresh_public_key.is_empty()
    {
        errors.push("Refresh token RSA key pair must be configured");
    }

    if config.mail.relay_url.is_empty() {
        errors.push("Mail relay URL must be configured in production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
