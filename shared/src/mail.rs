use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{MailSettings, Settings};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to reach mail API: {0}")]
    Transport(String),

    #[error("Mail API error: {status} - {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message, returning the provider's message id when it gives one.
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, MailError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Posts messages as JSON to a transactional-email HTTP API.
pub struct HttpMailer {
    client: Client,
    settings: MailSettings,
}

impl HttpMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, MailError> {
        let body = SendEmailRequest {
            from: &self.settings.from,
            to: vec![&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let mut request = self
            .client
            .post(&self.settings.api_url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Failed to send email to {}: {}", message.to, e);
            MailError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "Mail API returned error status {} for {}: {}",
                status, message.to, error_text
            );
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body: error_text,
            });
        }

        // Some providers answer 202 with an empty body.
        let parsed: Option<SendEmailResponse> = response.json().await.ok();
        let id = parsed.and_then(|r| r.id);
        info!("Email sent to {} (id={:?})", message.to, id);
        Ok(id)
    }
}

/// Writes messages to the log instead of sending them. Used when no mail
/// API is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, MailError> {
        info!(
            "Mail transport not configured; would send '{}' to {}",
            message.subject, message.to
        );
        Ok(None)
    }
}

pub fn mailer_from_settings(settings: &Settings) -> Arc<dyn Mailer> {
    match &settings.mail {
        Some(mail) => Arc::new(HttpMailer::new(mail.clone())),
        None => Arc::new(LogMailer),
    }
}
