use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Settings, UserAccount};

pub const SESSION_COOKIE: &str = "rsvp_session";
pub const SESSION_AUDIENCE: &str = "rsvp-session";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid authorization token")]
    InvalidToken,

    #[error("Invalid authorization scheme")]
    InvalidScheme,

    #[error("Session expired")]
    Expired,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Signing key is not configured")]
    MissingKey,

    #[error("Failed to issue session: {0}")]
    Issue(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::AdminRequired => StatusCode::FORBIDDEN,
            SessionError::MissingKey | SessionError::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        let mut response =
            (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    admin: bool,
    iat: i64,
    exp: i64,
    aud: String,
}

/// The logged-in organizer, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
}

/// Issues and verifies organizer session tokens and checks passwords.
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
    users: Vec<UserAccount>,
}

impl SessionManager {
    pub fn new(
        secret: &str,
        lifetime: Duration,
        users: Vec<UserAccount>,
    ) -> Result<Self, SessionError> {
        if secret.trim().is_empty() {
            return Err(SessionError::MissingKey);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
            users,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SessionError> {
        Self::new(
            &settings.signing_key,
            Duration::minutes(settings.session_minutes),
            settings.users.clone(),
        )
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Checks a username/password pair against the configured accounts.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<SessionUser, SessionError> {
        let account = self
            .users
            .iter()
            .find(|u| u.username == username)
            .ok_or(SessionError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash) {
            warn!("Failed login for user {}", username);
            return Err(SessionError::InvalidCredentials);
        }

        Ok(SessionUser {
            username: account.username.clone(),
            is_admin: account.is_admin,
        })
    }

    pub fn issue(&self, user: &SessionUser) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.username.clone(),
            admin: user.is_admin,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
            aud: SESSION_AUDIENCE.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Issue(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[SESSION_AUDIENCE]);

        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken,
            }
        })?;

        Ok(SessionUser {
            username: data.claims.sub,
            is_admin: data.claims.admin,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, SessionError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| SessionError::Issue(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        lifetime.num_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

fn bearer_token(request: &Request) -> Result<Option<String>, SessionError> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| SessionError::InvalidToken)?;

    let mut parts = value.trim().splitn(2, ' ');
    let scheme = parts.next().ok_or(SessionError::MissingToken)?;
    let token = parts.next().ok_or(SessionError::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        warn!("Invalid auth scheme: {}", scheme);
        return Err(SessionError::InvalidScheme);
    }
    Ok(Some(token.trim().to_string()))
}

fn cookie_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Accepts a bearer token or the session cookie and stores the
/// [`SessionUser`] as a request extension.
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, SessionError> {
    let token = match bearer_token(&request)? {
        Some(token) => token,
        None => cookie_token(&request).ok_or(SessionError::MissingToken)?,
    };

    let user = sessions.verify(&token)?;
    debug!("Authenticated request for user {}", user.username);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Must run inside [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, SessionError> {
    match request.extensions().get::<SessionUser>() {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        Some(user) => {
            warn!("User {} tried to reach an admin route", user.username);
            Err(SessionError::AdminRequired)
        }
        None => Err(SessionError::MissingToken),
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub const TEST_SIGNING_KEY: &str = "test-signing-key-do-not-use";

/// Session manager matching the tokens produced by [`create_test_request`].
#[cfg(any(test, feature = "test_utils"))]
pub fn test_session_manager(users: Vec<UserAccount>) -> SessionManager {
    SessionManager::new(TEST_SIGNING_KEY, Duration::minutes(30), users)
        .expect("test signing key is set")
}

/// Builds a request authenticated as an admin organizer.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    uri: &str,
    username: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    create_test_request_as(method, uri, username, true, body)
}

#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request_as(
    method: &str,
    uri: &str,
    username: &str,
    is_admin: bool,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    let token = test_session_manager(vec![])
        .issue(&SessionUser {
            username: username.to_string(),
            is_admin,
        })
        .expect("failed to issue test session");

    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .expect("failed to build test request"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("failed to build test request"),
    }
}

/// Builds a request without credentials.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_public_request(method: &str, uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .expect("failed to build test request")
}
