//! Applies a guest's confirm/decline decision to their entry in the event.
//!
//! The transition is idempotent: repeating a decision leaves the guest as it
//! was and writes nothing, while a different decision simply overwrites the
//! previous one.

use log::{debug, info, warn};
use thiserror::Error;

use crate::models::{normalize_email, now_str, Event, Guest, ResponseStatus};
use crate::store::{EventStore, StoreError};
use crate::token::{Intent, ResponseCapability, TokenCodec, TokenError};

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Response token is malformed")]
    Malformed,

    #[error("Response token signature is invalid")]
    InvalidSignature,

    #[error("Response token has expired")]
    Expired,

    #[error("Event {0} not found")]
    EventNotFound(String),

    #[error("Guest {email} not found in event {event_id}")]
    GuestNotFound { event_id: String, email: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TokenError> for ResponseError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ResponseError::Expired,
            TokenError::InvalidSignature => ResponseError::InvalidSignature,
            _ => ResponseError::Malformed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub event: Event,
    pub guest: Guest,
    pub status: ResponseStatus,
    /// False when the guest had already given this answer.
    pub changed: bool,
}

pub async fn apply<S>(
    store: &S,
    event_id: &str,
    guest_email: &str,
    intent: Intent,
) -> Result<Outcome, ResponseError>
where
    S: EventStore + ?Sized,
{
    apply_at(store, event_id, guest_email, intent, None, &now_str()).await
}

/// Like [`apply`], with an explicit decision time and an optional reason
/// recorded when declining.
pub async fn apply_at<S>(
    store: &S,
    event_id: &str,
    guest_email: &str,
    intent: Intent,
    decline_reason: Option<String>,
    at: &str,
) -> Result<Outcome, ResponseError>
where
    S: EventStore + ?Sized,
{
    let mut event = match store.get_event(event_id).await {
        Ok(event) => event,
        Err(StoreError::NotFound(_)) => {
            return Err(ResponseError::EventNotFound(event_id.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let email = normalize_email(guest_email);
    let guest_not_found = || ResponseError::GuestNotFound {
        event_id: event_id.to_string(),
        email: email.clone(),
    };

    let (index, current) = event.find_guest(&email).ok_or_else(guest_not_found)?;
    let target = intent.target_status();
    let reason = decline_reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty() && intent == Intent::Decline);

    if current.status == target && (reason.is_none() || current.decline_reason == reason) {
        debug!(
            "Guest {} already {} for event {}, nothing to write",
            email, target, event_id
        );
        let guest = current.clone();
        return Ok(Outcome {
            event,
            guest,
            status: target,
            changed: false,
        });
    }

    let stored_email = current.email.clone();
    let mut guest = current.clone();
    guest.set_status(target, at);
    if reason.is_some() {
        guest.decline_reason = reason;
    }

    match store
        .update_guest(event_id, index, &stored_email, guest.clone())
        .await
    {
        Ok(()) => {}
        Err(StoreError::ConditionFailed(msg)) => {
            warn!("Guest list changed while responding: {}", msg);
            return Err(guest_not_found());
        }
        Err(StoreError::NotFound(_)) => {
            return Err(ResponseError::EventNotFound(event_id.to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Guest {} of event {} is now {} (was {})",
        email, event_id, target, event.guests[index].status
    );
    event.guests[index] = guest.clone();

    Ok(Outcome {
        event,
        guest,
        status: target,
        changed: true,
    })
}

/// Verifies a link token and applies what it authorizes. `expected` is the
/// answer implied by the link the guest followed; a token for the other
/// answer is treated as malformed.
pub async fn respond_with_token<S>(
    store: &S,
    codec: &TokenCodec,
    token: &str,
    expected: Intent,
    decline_reason: Option<String>,
) -> Result<Outcome, ResponseError>
where
    S: EventStore + ?Sized,
{
    let ResponseCapability {
        event_id,
        email,
        intent,
    } = codec.decode(token)?;

    if intent != expected {
        warn!(
            "Token for {} presented on the {} link of event {}",
            intent, expected, event_id
        );
        return Err(ResponseError::Malformed);
    }

    apply_at(store, &event_id, &email, intent, decline_reason, &now_str()).await
}
