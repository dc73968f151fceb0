use axum::{
    extract::{Path, State},
    response::Html,
    Form, Json,
};
use log::debug;
use rsvp_shared::response::respond_with_token;
use rsvp_shared::store::EventStore;
use rsvp_shared::token::Intent;

use crate::models::DeclineForm;
use crate::pages::{acknowledgment, decline_with_reason_form, ResponsePageError};
use crate::state::AppState;

type PageResult = std::result::Result<Html<String>, ResponsePageError>;

// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// GET /respond/confirm/:token
pub async fn confirm_attendance<S>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> PageResult
where
    S: EventStore,
{
    let outcome =
        respond_with_token(state.store.as_ref(), &state.codec, &token, Intent::Confirm, None)
            .await?;
    debug!("Confirm link processed, changed={}", outcome.changed);
    Ok(Html(acknowledgment(&outcome)))
}

// GET /respond/decline/:token
pub async fn decline_attendance<S>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> PageResult
where
    S: EventStore,
{
    let outcome =
        respond_with_token(state.store.as_ref(), &state.codec, &token, Intent::Decline, None)
            .await?;
    debug!("Decline link processed, changed={}", outcome.changed);
    // The form posts back to this same path.
    Ok(Html(decline_with_reason_form(&outcome, &token)))
}

// POST /respond/decline/:token
pub async fn decline_with_reason<S>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
    Form(form): Form<DeclineForm>,
) -> PageResult
where
    S: EventStore,
{
    let outcome = respond_with_token(
        state.store.as_ref(),
        &state.codec,
        &token,
        Intent::Decline,
        form.reason,
    )
    .await?;
    Ok(Html(acknowledgment(&outcome)))
}
