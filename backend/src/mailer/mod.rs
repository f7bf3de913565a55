//! Outbound email delivery
//!
//! Mail is an external collaborator behind a trait. `HttpMailer` posts to an
//! HTTP relay with a bounded timeout; `LogMailer` just logs the links and is
//! the development default when no relay is configured.

use crate::config::MailConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outbound mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, name: &str, url: &str) -> Result<()>;
    async fn send_password_reset(&self, to: &str, name: &str, url: &str) -> Result<()>;
}

/// Build a mailer from configuration
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.relay_url.is_empty() {
        warn!("No mail relay configured, emails will only be logged");
        return Ok(Arc::new(LogMailer));
    }
    Ok(Arc::new(HttpMailer::new(config)?))
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Mailer posting JSON messages to an HTTP relay
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build mail relay client")?;

        Ok(Self {
            client,
            relay_url: config.relay_url.clone(),
            from: config.from.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, text: String) -> Result<()> {
        let message = MailMessage {
            from: &self.from,
            to,
            subject,
            text,
        };

        self.client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .context("mail relay request failed")?
            .error_for_status()
            .context("mail relay rejected the message")?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_verification(&self, to: &str, name: &str, url: &str) -> Result<()> {
        self.send(
            to,
            "Verify your email address",
            format!(
                "Hi {name},\n\nPlease verify your email address by opening this link:\n{url}\n\nThe link expires in 24 hours."
            ),
        )
        .await
    }

    async fn send_password_reset(&self, to: &str, name: &str, url: &str) -> Result<()> {
        self.send(
            to,
            "Reset your password",
            format!(
                "Hi {name},\n\nYou can reset your password by opening this link:\n{url}\n\nThe link expires in 10 minutes. If you did not request a reset, you can ignore this email."
            ),
        )
        .await
    }
}

/// Development mailer that logs the links instead of sending
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, _name: &str, url: &str) -> Result<()> {
        info!(to, url, "verification email (log only)");
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, _name: &str, url: &str) -> Result<()> {
        info!(to, url, "password reset email (log only)");
        Ok(())
    }
}
