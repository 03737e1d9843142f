use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{MailError, Mailer, OutboundEmail};
use crate::config::MailConfig;

/// POSTs `{from, to, subject, html}` as JSON to the third-party mailer.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    url: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("build mailer http client")?;
        Ok(Self {
            client,
            url: config.mailer_url.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: OutboundEmail) -> Result<(), MailError> {
        let res = self.client.post(&self.url).json(&mail).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(MailError::Status(status));
        }
        // The mailer's reply is informational only.
        let body: serde_json::Value = res.json().await?;
        debug!(to = %mail.to, response = %body, "email accepted by mailer");
        Ok(())
    }
}
