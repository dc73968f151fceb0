use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

use crate::dispatch::ResponseLinks;
use crate::mail::{EmailMessage, MailError, Mailer};

/// Records messages instead of sending them.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Every later send to `email` fails as if the provider rejected it.
    pub async fn fail_for(&self, email: &str) {
        self.failing.lock().await.insert(email.to_string());
    }

    /// Pulls the confirm and decline links out of a rendered message.
    pub fn extract_links(message: &EmailMessage) -> ResponseLinks {
        let hrefs: Vec<&str> = message
            .html
            .split("href=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect();
        let find = |needle: &str| {
            hrefs
                .iter()
                .find(|h| h.contains(needle))
                .map(|h| h.to_string())
                .unwrap_or_default()
        };
        ResponseLinks {
            confirm: find("/respond/confirm/"),
            decline: find("/respond/decline/"),
        }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, MailError> {
        if self.failing.lock().await.contains(&message.to) {
            return Err(MailError::Rejected {
                status: 422,
                body: format!("recipient {} rejected", message.to),
            });
        }
        let mut sent = self.sent.lock().await;
        sent.push(message.clone());
        Ok(Some(format!("mock-{}", sent.len())))
    }
}
