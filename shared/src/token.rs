//! Signed guest-response links.
//!
//! A response token is a compact HS256 JWS carrying the event id, the guest's
//! email, the intended answer and an expiry. Nothing is stored server side:
//! any token that verifies under the process signing key and has not expired
//! is honoured, and rotating the key revokes every outstanding link at once.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::Settings;
use crate::models::{normalize_email, ResponseStatus};

/// Audience marker keeping response links and session tokens apart even
/// though both are signed with the same key.
pub const RESPONSE_AUDIENCE: &str = "rsvp-response";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Signing key is not configured")]
    MissingKey,

    #[error("Token validity window must be positive")]
    InvalidValidity,

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token could not be parsed")]
    Malformed,

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Confirm,
    Decline,
}

impl Intent {
    pub fn target_status(self) -> ResponseStatus {
        match self {
            Intent::Confirm => ResponseStatus::Confirmed,
            Intent::Decline => ResponseStatus::Declined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Confirm => "confirm",
            Intent::Decline => "decline",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(Intent::Confirm),
            "decline" => Ok(Intent::Decline),
            _ => Err(TokenError::Malformed),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ResponseClaims {
    event_id: String,
    email: String,
    action: Intent,
    exp: i64,
    aud: String,
}

/// What a verified token authorizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCapability {
    pub event_id: String,
    pub email: String,
    pub intent: Intent,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, validity: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingKey);
        }
        if validity <= Duration::zero() {
            return Err(TokenError::InvalidValidity);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, TokenError> {
        Self::new(
            &settings.signing_key,
            Duration::days(settings.token_validity_days),
        )
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Signs a link for the configured validity window.
    pub fn encode(&self, event_id: &str, email: &str, intent: Intent) -> Result<String, TokenError> {
        self.encode_at(event_id, email, intent, self.validity, Utc::now())
    }

    pub fn encode_with_validity(
        &self,
        event_id: &str,
        email: &str,
        intent: Intent,
        validity: Duration,
    ) -> Result<String, TokenError> {
        self.encode_at(event_id, email, intent, validity, Utc::now())
    }

    pub fn encode_at(
        &self,
        event_id: &str,
        email: &str,
        intent: Intent,
        validity: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if validity <= Duration::zero() {
            return Err(TokenError::InvalidValidity);
        }

        let claims = ResponseClaims {
            event_id: event_id.to_string(),
            email: normalize_email(email),
            action: intent,
            exp: (now + validity).timestamp(),
            aud: RESPONSE_AUDIENCE.to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<ResponseCapability, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Expiry is checked before the signature, so a stale link reports
    /// `Expired` even when it was also tampered with.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<ResponseCapability, TokenError> {
        let unverified = peek_claims(token)?;
        if unverified.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[RESPONSE_AUDIENCE]);
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "aud".to_string()]);

        let verified = decode::<ResponseClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAudience => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = verified.claims;
        Ok(ResponseCapability {
            event_id: claims.event_id,
            email: claims.email,
            intent: claims.action,
        })
    }
}

/// Parses the payload without checking the signature.
fn peek_claims(token: &str) -> Result<ResponseClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    decode::<ResponseClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Malformed)
}
