use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::{debug, info};
use rsvp_shared::models::{is_valid_email, normalize_email, now_str, Guest, MessageResponse};
use rsvp_shared::store::EventStore;
use std::collections::HashSet;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::import::{parse_guest_workbook, ImportPreview};
use crate::models::{NewGuestRequest, RejectedGuest, UpdateGuestRequest};
use crate::state::AppState;

// POST /events/:id/guests
pub async fn add_guest<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(request): Json<NewGuestRequest>,
) -> Result<(StatusCode, Json<Guest>)>
where
    S: EventStore,
{
    let email = normalize_email(&request.email);
    let request = NewGuestRequest { email, ..request };
    request.validate()?;

    let event = state.store.get_event(&id).await?;
    if event.has_guest(&request.email) {
        return Err(AppError::conflict(format!(
            "Guest {} is already on the list",
            request.email
        )));
    }

    let guest = Guest::new(request.name.trim(), &request.email, request.phone);
    state.store.append_guests(&id, vec![guest.clone()]).await?;
    info!("Added guest {} to event {}", guest.email, id);

    Ok((StatusCode::CREATED, Json(guest)))
}

// PATCH /events/:id/guests/:email
pub async fn update_guest<S>(
    State(state): State<AppState<S>>,
    Path((id, email)): Path<(String, String)>,
    Json(request): Json<UpdateGuestRequest>,
) -> Result<Json<Guest>>
where
    S: EventStore,
{
    if request.status.is_none() && request.notes.is_none() {
        return Err(AppError::bad_request("No fields to update".into()));
    }

    let event = state.store.get_event(&id).await?;
    let (index, current) = event
        .find_guest(&email)
        .ok_or_else(|| AppError::not_found(format!("Guest {} not found", email)))?;

    let now = now_str();
    let mut guest = current.clone();
    if let Some(status) = request.status {
        if status != guest.status {
            guest.set_status(status, &now);
        }
    }
    if let Some(notes) = request.notes {
        let notes = notes.trim().to_string();
        guest.notes = Some(notes).filter(|n| !n.is_empty());
        guest.notes_updated_at = Some(now);
    }

    state
        .store
        .update_guest(&id, index, &current.email, guest.clone())
        .await?;
    debug!("Organizer updated guest {} of event {}", guest.email, id);

    Ok(Json(guest))
}

// DELETE /events/:id/guests/:email
pub async fn delete_guest<S>(
    State(state): State<AppState<S>>,
    Path((id, email)): Path<(String, String)>,
) -> Result<Json<MessageResponse>>
where
    S: EventStore,
{
    let mut event = state.store.get_event(&id).await?;
    let (index, _) = event
        .find_guest(&email)
        .ok_or_else(|| AppError::not_found(format!("Guest {} not found", email)))?;

    let removed = event.guests.remove(index);
    state.store.replace_guest_list(&id, event.guests).await?;
    info!("Removed guest {} from event {}", removed.email, id);

    Ok(Json(MessageResponse {
        message: format!("Guest {} removed", removed.email),
    }))
}

// POST /events/:id/guests/import
pub async fn preview_import<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ImportPreview>>
where
    S: EventStore,
{
    // 404 for unknown events before parsing anything.
    state.store.get_event(&id).await?;

    let preview = parse_guest_workbook(&body)?;
    Ok(Json(preview))
}

// POST /events/:id/guests/import/confirm
pub async fn confirm_import<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(guests): Json<Vec<NewGuestRequest>>,
) -> Result<Json<serde_json::Value>>
where
    S: EventStore,
{
    let event = state.store.get_event(&id).await?;

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    let mut seen: HashSet<String> = event.guests.iter().map(|g| normalize_email(&g.email)).collect();

    for request in guests {
        let email = normalize_email(&request.email);
        let name = request.name.trim().to_string();
        let reason = if name.is_empty() {
            Some("missing name")
        } else if !is_valid_email(&email) {
            Some("invalid email")
        } else if !seen.insert(email.clone()) {
            Some("already on the guest list")
        } else {
            None
        };

        match reason {
            Some(reason) => skipped.push(RejectedGuest {
                name: Some(name).filter(|n| !n.is_empty()),
                email: request.email,
                reason: reason.to_string(),
            }),
            None => added.push(Guest::new(name, &email, request.phone)),
        }
    }

    if !added.is_empty() {
        state.store.append_guests(&id, added.clone()).await?;
    }
    info!(
        "Imported {} guests into event {}, skipped {}",
        added.len(),
        id,
        skipped.len()
    );

    Ok(Json(serde_json::json!({
        "added": added,
        "skipped": skipped,
    })))
}
