use log::{info, warn};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_TOKEN_VALIDITY_DAYS: i64 = 7;
pub const DEFAULT_SESSION_MINUTES: i64 = 30;
pub const DEFAULT_EVENTS_TABLE: &str = "rsvp-events";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// An organizer account allowed to log in.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Transactional-email API settings. Absent when `MAIL_API_URL` is unset.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub signing_key: String,
    pub token_validity_days: i64,
    pub session_minutes: i64,
    pub public_base_url: String,
    pub users: Vec<UserAccount>,
    pub events_table: String,
    pub mail: Option<MailSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let signing_key = env::var("RSVP_SIGNING_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("RSVP_SIGNING_KEY"))?;

        let token_validity_days = parse_or(
            "RSVP_TOKEN_VALIDITY_DAYS",
            DEFAULT_TOKEN_VALIDITY_DAYS,
        )?;
        if token_validity_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "RSVP_TOKEN_VALIDITY_DAYS",
                reason: "must be positive".to_string(),
            });
        }

        let session_minutes = parse_or("RSVP_SESSION_MINUTES", DEFAULT_SESSION_MINUTES)?;
        if session_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "RSVP_SESSION_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        let public_base_url = env::var("RSVP_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let users = match env::var("RSVP_USERS") {
            Ok(raw) => parse_users(&raw)?,
            Err(_) => {
                warn!("RSVP_USERS not set, no organizer can log in");
                Vec::new()
            }
        };

        let events_table =
            env::var("EVENTS_TABLE").unwrap_or_else(|_| DEFAULT_EVENTS_TABLE.to_string());

        let mail = match env::var("MAIL_API_URL") {
            Ok(api_url) => Some(MailSettings {
                api_url,
                api_key: env::var("MAIL_API_KEY").ok(),
                from: env::var("MAIL_FROM").map_err(|_| ConfigError::Missing("MAIL_FROM"))?,
            }),
            Err(_) => {
                info!("MAIL_API_URL not set, outgoing mail will only be logged");
                None
            }
        };

        Ok(Self {
            signing_key,
            token_validity_days,
            session_minutes,
            public_base_url,
            users,
            events_table,
            mail,
        })
    }
}

pub fn parse_users(raw: &str) -> Result<Vec<UserAccount>, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
        key: "RSVP_USERS",
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users() {
        let users = parse_users(
            r#"[{"username": "organizer", "passwordHash": "$argon2id$x", "isAdmin": true},
                {"username": "helper", "passwordHash": "$argon2id$y"}]"#,
        )
        .unwrap();

        assert_eq!(users.len(), 2);
        assert!(users[0].is_admin);
        assert!(!users[1].is_admin);
        assert!(parse_users("not json").is_err());
    }

    // Single test so the env mutations cannot race each other.
    #[test]
    fn test_from_env() {
        env::remove_var("RSVP_SIGNING_KEY");
        assert!(matches!(
            Settings::from_env(),
            Err(ConfigError::Missing("RSVP_SIGNING_KEY"))
        ));

        env::set_var("RSVP_SIGNING_KEY", "   ");
        assert!(Settings::from_env().is_err());

        env::set_var("RSVP_SIGNING_KEY", "config-test-key");
        env::set_var("RSVP_TOKEN_VALIDITY_DAYS", "abc");
        assert!(matches!(
            Settings::from_env(),
            Err(ConfigError::Invalid { key: "RSVP_TOKEN_VALIDITY_DAYS", .. })
        ));

        env::set_var("RSVP_TOKEN_VALIDITY_DAYS", "0");
        assert!(Settings::from_env().is_err());

        env::set_var("RSVP_TOKEN_VALIDITY_DAYS", "14");
        env::set_var("RSVP_PUBLIC_BASE_URL", "https://rsvp.example.com/");
        env::remove_var("MAIL_API_URL");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.signing_key, "config-test-key");
        assert_eq!(settings.token_validity_days, 14);
        assert_eq!(settings.public_base_url, "https://rsvp.example.com");
        assert!(settings.mail.is_none());

        env::remove_var("RSVP_TOKEN_VALIDITY_DAYS");
        env::remove_var("RSVP_PUBLIC_BASE_URL");
        env::remove_var("RSVP_SIGNING_KEY");
    }
}
