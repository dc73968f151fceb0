use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use log::{debug, info};
use rsvp_shared::auth::SessionUser;
use rsvp_shared::models::{normalize_email, now_str, Event, Guest, MessageResponse};
use rsvp_shared::store::EventStore;
use std::collections::HashSet;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{CreateEventRequest, EventSummary, UpdateEventRequest};
use crate::state::AppState;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// GET /events
pub async fn list_events<S>(State(state): State<AppState<S>>) -> Result<Json<serde_json::Value>>
where
    S: EventStore,
{
    let events = state.store.list_events().await?;
    let summaries: Vec<EventSummary> = events.iter().map(EventSummary::from).collect();

    Ok(Json(serde_json::json!({ "events": summaries })))
}

// POST /events
pub async fn create_event<S>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)>
where
    S: EventStore,
{
    request.validate()?;

    let mut seen = HashSet::new();
    let mut guests = Vec::with_capacity(request.guests.len());
    for guest in request.guests {
        let email = normalize_email(&guest.email);
        if !seen.insert(email.clone()) {
            return Err(AppError::bad_request(format!(
                "Guest {} is listed more than once",
                email
            )));
        }
        guests.push(Guest::new(guest.name.trim(), &email, guest.phone));
    }

    let now = now_str();
    let event = Event {
        id: String::new(),
        name: request.name.trim().to_string(),
        responsible: request.responsible.trim().to_string(),
        date: request.date,
        time: request.time,
        venue: request.venue.trim().to_string(),
        description: non_blank(request.description),
        category: non_blank(request.category),
        status: non_blank(request.status),
        capacity: request.capacity,
        created_at: now.clone(),
        updated_at: now,
        guests,
    };

    let event = state.store.create_event(event).await?;
    info!(
        "User {} created event {} with {} guests",
        user.username,
        event.id,
        event.guests.len()
    );

    Ok((StatusCode::CREATED, Json(event)))
}

// GET /events/:id
pub async fn get_event<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Event>>
where
    S: EventStore,
{
    let event = state.store.get_event(&id).await?;
    Ok(Json(event))
}

// PATCH /events/:id
pub async fn update_event<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<Event>>
where
    S: EventStore,
{
    request.validate()?;
    if request.is_empty() {
        return Err(AppError::bad_request("No fields to update".into()));
    }

    let mut event = state.store.get_event(&id).await?;

    if let Some(name) = request.name {
        event.name = name.trim().to_string();
    }
    if let Some(responsible) = request.responsible {
        event.responsible = responsible.trim().to_string();
    }
    if let Some(date) = request.date {
        event.date = date;
    }
    if let Some(time) = request.time {
        event.time = time;
    }
    if let Some(venue) = request.venue {
        event.venue = venue.trim().to_string();
    }
    // An empty string clears the optional fields.
    if request.description.is_some() {
        event.description = non_blank(request.description);
    }
    if request.category.is_some() {
        event.category = non_blank(request.category);
    }
    if request.status.is_some() {
        event.status = non_blank(request.status);
    }
    if request.capacity.is_some() {
        event.capacity = request.capacity;
    }
    event.updated_at = now_str();

    let event = state.store.update_event(event).await?;
    debug!("Updated event {}", event.id);

    Ok(Json(event))
}

// DELETE /events/:id
pub async fn delete_event<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>>
where
    S: EventStore,
{
    state.store.delete_event(&id).await?;
    info!("Deleted event {}", id);

    Ok(Json(MessageResponse {
        message: format!("Event {} deleted", id),
    }))
}
