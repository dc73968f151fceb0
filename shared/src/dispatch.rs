//! Builds invitation and reminder emails carrying signed response links and
//! hands them to the mail transport.

use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::mail::{EmailMessage, MailError, Mailer};
use crate::models::{Event, Guest};
use crate::token::{Intent, TokenCodec, TokenError};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to create response link: {0}")]
    Token(#[from] TokenError),

    #[error("Failed to deliver email: {0}")]
    Mail(#[from] MailError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Invitation,
    /// The n-th reminder, starting at 1.
    Reminder(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLinks {
    pub confirm: String,
    pub decline: String,
}

pub struct InvitationDispatcher {
    codec: Arc<TokenCodec>,
    mailer: Arc<dyn Mailer>,
    public_base_url: String,
}

impl InvitationDispatcher {
    pub fn new(codec: Arc<TokenCodec>, mailer: Arc<dyn Mailer>, public_base_url: &str) -> Self {
        Self {
            codec,
            mailer,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fresh confirm and decline links for a guest. Earlier links stay valid
    /// until they expire.
    pub fn links(&self, event_id: &str, email: &str) -> Result<ResponseLinks, TokenError> {
        let confirm = self.codec.encode(event_id, email, Intent::Confirm)?;
        let decline = self.codec.encode(event_id, email, Intent::Decline)?;
        Ok(ResponseLinks {
            confirm: format!("{}/respond/confirm/{}", self.public_base_url, confirm),
            decline: format!("{}/respond/decline/{}", self.public_base_url, decline),
        })
    }

    pub async fn send(
        &self,
        event: &Event,
        guest: &Guest,
        kind: MessageKind,
    ) -> Result<(), DispatchError> {
        let links = self.links(&event.id, &guest.email)?;
        let message = render_message(event, guest, &links, kind);
        self.mailer.send(&message).await?;
        info!(
            "Sent {:?} for event {} to {}",
            kind, event.id, guest.email
        );
        Ok(())
    }
}

pub fn render_message(
    event: &Event,
    guest: &Guest,
    links: &ResponseLinks,
    kind: MessageKind,
) -> EmailMessage {
    let event_name = escape_html(&event.name);
    let (subject, opening) = match kind {
        MessageKind::Invitation => (
            format!("Invitation to {}", event.name),
            format!(
                "You are invited to <strong>{}</strong>.",
                event_name
            ),
        ),
        MessageKind::Reminder(_) => (
            format!("Reminder: will you attend {}?", event.name),
            format!(
                "We have not heard back from you about <strong>{}</strong> yet.",
                event_name
            ),
        ),
    };

    let html = format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f8f9fa; margin: 0; padding: 0;">
    <div style="max-width: 600px; margin: 20px auto; background: white; padding: 20px; border-radius: 10px;">
      <h2 style="color: #1a73e8;">Hello, {guest_name}!</h2>
      <p>{opening}</p>
      <div style="background-color: #f8f9fa; padding: 15px; border-radius: 5px; margin: 20px 0;">
        <p style="margin: 5px 0;"><strong>Date:</strong> {date}</p>
        <p style="margin: 5px 0;"><strong>Time:</strong> {time}</p>
        <p style="margin: 5px 0;"><strong>Venue:</strong> {venue}</p>
      </div>
      <p>Please let us know if you can make it:</p>
      <div style="text-align: center; margin: 30px 0;">
        <a href="{confirm}" style="background-color: #4CAF50; color: white; padding: 12px 25px; text-decoration: none; border-radius: 5px; margin: 0 10px; display: inline-block; font-weight: bold;">Confirm attendance</a>
        <a href="{decline}" style="background-color: #dc3545; color: white; padding: 12px 25px; text-decoration: none; border-radius: 5px; margin: 10px; display: inline-block; font-weight: bold;">I can't make it</a>
      </div>
      <p style="color: #666; font-size: 12px; border-top: 1px solid #eee; margin-top: 20px; padding-top: 20px;">
        This is an automated message, please do not reply.<br>
        If the buttons do not work, copy these links into your browser:<br>
        {confirm}<br>
        {decline}
      </p>
    </div>
  </body>
</html>"#,
        guest_name = escape_html(&guest.name),
        opening = opening,
        date = escape_html(&event.date),
        time = escape_html(&event.time),
        venue = escape_html(&event.venue),
        confirm = links.confirm,
        decline = links.decline,
    );

    EmailMessage {
        to: guest.email.clone(),
        subject,
        html,
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
