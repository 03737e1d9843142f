//! Outbound email: a `Mailer` seam, the HTTP client for the third-party
//! mailer, and a bounded outbox drained by a background worker.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::config::{MailConfig, MailDelivery};

mod client;
mod queue;
pub mod templates;

pub use client::HttpMailer;
pub use queue::QueuedMailer;

/// Body accepted by the mailer endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mailer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mailer responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("mail queue is full")]
    QueueFull,

    #[error("mail queue is closed")]
    QueueClosed,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutboundEmail) -> Result<(), MailError>;
}

/// Builds the configured mailer. In queued mode this spawns the worker, so it
/// must run inside the tokio runtime.
pub fn build(config: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    let http = HttpMailer::new(config)?;
    let mailer: Arc<dyn Mailer> = match config.delivery {
        MailDelivery::Inline => Arc::new(http),
        MailDelivery::Queued => Arc::new(QueuedMailer::spawn(Arc::new(http), config.queue_capacity)),
    };
    Ok(mailer)
}

/// Sends after the store write has already happened. A failure is logged and
/// does not fail the request: the user can ask for the mail again.
pub async fn deliver(mailer: &dyn Mailer, mail: OutboundEmail) {
    let to = mail.to.clone();
    let subject = mail.subject.clone();
    if let Err(e) = mailer.send(mail).await {
        warn!(error = %e, %to, %subject, "email not delivered");
    }
}
