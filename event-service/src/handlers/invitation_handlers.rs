use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use log::{error, info, warn};
use rsvp_shared::dispatch::MessageKind;
use rsvp_shared::models::{normalize_email, now_str, ResponseStatus};
use rsvp_shared::store::EventStore;
use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::{RejectedGuest, SendInvitationsRequest};
use crate::state::AppState;

// POST /events/:id/invitations
pub async fn send_invitations<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>>
where
    S: EventStore,
{
    // The body is optional; without it every pending guest is invited.
    let request: SendInvitationsRequest = if body.iter().all(|b| b.is_ascii_whitespace()) {
        SendInvitationsRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let event = state.store.get_event(&id).await?;

    let mut failed = Vec::new();
    // Each guest gets one invitation however often the request names them.
    let mut seen = HashSet::new();
    let targets: Vec<usize> = match request.emails {
        Some(emails) => emails
            .iter()
            .filter_map(|email| match event.find_guest(email) {
                Some((index, _)) => seen.insert(index).then_some(index),
                None => {
                    failed.push(RejectedGuest {
                        name: None,
                        email: normalize_email(email),
                        reason: "not on the guest list".to_string(),
                    });
                    None
                }
            })
            .collect(),
        None => event
            .guests
            .iter()
            .enumerate()
            .filter(|(_, g)| g.status == ResponseStatus::Pending)
            .map(|(index, _)| index)
            .collect(),
    };

    info!(
        "Sending {} invitations for event {}",
        targets.len(),
        event.id
    );

    let mut sent = Vec::new();
    for index in targets {
        let guest = &event.guests[index];
        if let Err(e) = state
            .dispatcher
            .send(&event, guest, MessageKind::Invitation)
            .await
        {
            warn!("Invitation to {} failed: {}", guest.email, e);
            failed.push(RejectedGuest {
                name: Some(guest.name.clone()),
                email: guest.email.clone(),
                reason: e.to_string(),
            });
            continue;
        }

        let mut updated = guest.clone();
        updated.invited_at = Some(now_str());
        updated.reminders_sent = 0;
        // The email went out, so a failed bookkeeping write is only logged.
        if let Err(e) = state
            .store
            .update_guest(&event.id, index, &guest.email, updated)
            .await
        {
            error!("Failed to record invitation for {}: {}", guest.email, e);
        }
        sent.push(guest.email.clone());
    }

    Ok(Json(serde_json::json!({
        "sent": sent,
        "failed": failed,
    })))
}
