use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::MailConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Client for a Brevo-compatible transactional email endpoint.
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl MailClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("VidJudge/0.1")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self::with_shared_client(client, config))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &MailConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.sender_email.trim().is_empty()
    }

    /// Sends one message to every recipient in a single API call.
    pub async fn send(&self, recipients: &[String], email: &OutgoingEmail) -> Result<()> {
        if recipients.is_empty() {
            bail!("No recipients");
        }

        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.sender_email.clone(),
                name: Some(self.sender_name.clone()).filter(|n| !n.is_empty()),
            },
            to: recipients
                .iter()
                .map(|email| EmailAddress {
                    email: email.clone(),
                    name: None,
                })
                .collect(),
            subject: email.subject.clone(),
            html_content: email.html.clone(),
            text_content: email.text.clone(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("Mail API request failed")?;

        let status = response.status();
        if status.is_success() {
            debug!(recipients = recipients.len(), subject = %email.subject, "Mail accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        bail!("Mail API error: {status} - {body}")
    }
}
