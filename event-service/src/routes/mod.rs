use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    auth_handlers::{login, logout, me},
    event_handlers::{create_event, delete_event, get_event, list_events, update_event},
    guest_handlers::{add_guest, confirm_import, delete_guest, preview_import, update_guest},
    invitation_handlers::send_invitations,
    report_handlers::{export_report, report_summary},
    response_handlers::{confirm_attendance, decline_attendance, decline_with_reason, health},
};
use crate::state::AppState;
use rsvp_shared::auth::{admin_middleware, auth_middleware, SessionManager};
use rsvp_shared::config::Settings;
use rsvp_shared::dispatch::InvitationDispatcher;
use rsvp_shared::mail::mailer_from_settings;
use rsvp_shared::store::{dynamo::DynamoEventStore, EventStore};
use rsvp_shared::token::TokenCodec;

/// Creates a router backed by DynamoDB and the configured mail transport.
pub async fn create_router(settings: &Settings) -> Result<Router, String> {
    info!("Creating router with DynamoDB store");

    let store = Arc::new(DynamoEventStore::with_table(settings.events_table.clone()).await);
    let codec = Arc::new(TokenCodec::from_settings(settings).map_err(|e| e.to_string())?);
    let sessions = Arc::new(SessionManager::from_settings(settings).map_err(|e| e.to_string())?);
    let dispatcher = Arc::new(InvitationDispatcher::new(
        codec.clone(),
        mailer_from_settings(settings),
        &settings.public_base_url,
    ));

    // Check if we should remove the base path prefix
    let remove_base_path = std::env::var("REMOVE_BASE_PATH")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    let prefix = if remove_base_path { "" } else { "/Prod" };
    info!("Using API route prefix: {}", prefix);

    Ok(create_router_with_state(
        AppState::new(store, codec, sessions, dispatcher),
        prefix,
    ))
}

/// Creates a router around any store implementation.
pub fn create_router_with_state<S>(state: AppState<S>, prefix: &str) -> Router
where
    S: EventStore + 'static,
{
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Logging middleware to trace all requests
    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    let sessions: Arc<SessionManager> = state.sessions.clone();

    // Guests and logins arrive without a session
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/respond/confirm/:token", get(confirm_attendance::<S>))
        .route(
            "/respond/decline/:token",
            get(decline_attendance::<S>).post(decline_with_reason::<S>),
        )
        .route("/auth/token", post(login::<S>))
        .route("/auth/logout", post(logout));

    let organizer_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/events", get(list_events::<S>).post(create_event::<S>))
        .route(
            "/events/:id",
            get(get_event::<S>)
                .patch(update_event::<S>)
                .delete(delete_event::<S>),
        )
        .route("/events/:id/guests", post(add_guest::<S>))
        .route(
            "/events/:id/guests/:email",
            axum::routing::patch(update_guest::<S>).delete(delete_guest::<S>),
        )
        .route("/events/:id/guests/import", post(preview_import::<S>))
        .route(
            "/events/:id/guests/import/confirm",
            post(confirm_import::<S>),
        )
        .route("/events/:id/invitations", post(send_invitations::<S>))
        .route_layer(middleware::from_fn_with_state(
            sessions.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/reports/summary", get(report_summary::<S>))
        .route("/reports/export", get(export_report::<S>))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(sessions, auth_middleware));

    let api_routes = public_routes
        .merge(organizer_routes)
        .merge(admin_routes)
        .with_state(state);

    let router = if prefix.is_empty() {
        // For tests or when no prefix is needed, don't nest the routes
        api_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, api_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    info!(
        "Router configured with all routes and middleware under prefix: '{}'",
        prefix
    );

    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
