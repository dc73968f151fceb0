use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use log::{info, warn};
use rsvp_shared::auth::{clear_session_cookie, session_cookie, SessionUser};
use rsvp_shared::models::MessageResponse;

use crate::error::{AppError, Result};
use crate::models::{LoginRequest, LoginResponse};
use crate::state::AppState;

async fn read_credentials(request: Request) -> Result<LoginRequest> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let Json(credentials) = Json::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(credentials)
    } else {
        let Form(credentials) = Form::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(credentials)
    }
}

// POST /auth/token
pub async fn login<S>(State(state): State<AppState<S>>, request: Request) -> Result<Response> {
    let credentials = read_credentials(request).await?;

    let user = state
        .sessions
        .authenticate(&credentials.username, &credentials.password)
        .map_err(|e| {
            warn!("Failed login for user {}", credentials.username);
            AppError::from(e)
        })?;
    let token = state.sessions.issue(&user)?;
    let lifetime = state.sessions.lifetime();

    info!("User {} logged in", user.username);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token, lifetime))],
        Json(LoginResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            expires_in: lifetime.num_seconds(),
        }),
    )
        .into_response())
}

// POST /auth/logout
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

// GET /auth/me
pub async fn me(Extension(user): Extension<SessionUser>) -> Json<SessionUser> {
    Json(user)
}
