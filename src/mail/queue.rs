use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use super::{MailError, Mailer, OutboundEmail};

/// Bounded outbox in front of another mailer. `send` only enqueues; a single
/// worker task performs delivery, one mail at a time, without retries.
#[derive(Clone)]
pub struct QueuedMailer {
    tx: mpsc::Sender<OutboundEmail>,
}

impl QueuedMailer {
    pub fn spawn(inner: Arc<dyn Mailer>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<OutboundEmail>(capacity);
        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                let to = mail.to.clone();
                match inner.send(mail).await {
                    Ok(()) => info!(%to, "email delivered"),
                    Err(e) => warn!(error = %e, %to, "email delivery failed"),
                }
            }
            info!("mail worker stopped");
        });
        Self { tx }
    }
}

#[async_trait]
impl Mailer for QueuedMailer {
    async fn send(&self, mail: OutboundEmail) -> Result<(), MailError> {
        self.tx.try_send(mail).map_err(|e| match e {
            TrySendError::Full(_) => MailError::QueueFull,
            TrySendError::Closed(_) => MailError::QueueClosed,
        })
    }
}
