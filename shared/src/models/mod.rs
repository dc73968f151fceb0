use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidateEmail;

/// Current time as an RFC 3339 string, the format used for every stored timestamp.
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

/// Guests are keyed by email within an event, so every write and every
/// lookup goes through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks an already-normalized address.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.validate_email()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Pending => write!(f, "pending"),
            ResponseStatus::Confirmed => write!(f, "confirmed"),
            ResponseStatus::Declined => write!(f, "declined"),
        }
    }
}

/// One invitee, embedded in its event's guest list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<String>,
    #[serde(default)]
    pub declined_at: Option<String>,
    #[serde(default)]
    pub notes_updated_at: Option<String>,
    #[serde(default)]
    pub invited_at: Option<String>,
    #[serde(default)]
    pub reminders_sent: u32,
}

impl Guest {
    pub fn new(name: impl Into<String>, email: &str, phone: Option<String>) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
            phone: phone.filter(|p| !p.trim().is_empty()),
            status: ResponseStatus::Pending,
            notes: None,
            decline_reason: None,
            confirmed_at: None,
            declined_at: None,
            notes_updated_at: None,
            invited_at: None,
            reminders_sent: 0,
        }
    }

    pub fn matches_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    /// Moves the guest to `status`, stamping the matching decision time.
    pub fn set_status(&mut self, status: ResponseStatus, at: &str) {
        self.status = status;
        match status {
            ResponseStatus::Confirmed => {
                self.confirmed_at = Some(at.to_string());
                self.decline_reason = None;
            }
            ResponseStatus::Declined => self.declined_at = Some(at.to_string()),
            ResponseStatus::Pending => {}
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub responsible: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub guests: Vec<Guest>,
}

impl Event {
    /// First guest with this email. Duplicates are not expected, but older
    /// lists may contain them and the earliest entry wins.
    pub fn find_guest(&self, email: &str) -> Option<(usize, &Guest)> {
        self.guests
            .iter()
            .enumerate()
            .find(|(_, g)| g.matches_email(email))
    }

    pub fn has_guest(&self, email: &str) -> bool {
        self.find_guest(email).is_some()
    }

    pub fn attendance(&self) -> Attendance {
        let mut counts = Attendance::default();
        for guest in &self.guests {
            counts.add(guest.status);
        }
        counts
    }
}

/// Response counts over a set of guests.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub total: usize,
    pub confirmed: usize,
    pub declined: usize,
    pub pending: usize,
}

impl Attendance {
    pub fn add(&mut self, status: ResponseStatus) {
        self.total += 1;
        match status {
            ResponseStatus::Confirmed => self.confirmed += 1,
            ResponseStatus::Declined => self.declined += 1,
            ResponseStatus::Pending => self.pending += 1,
        }
    }

    pub fn merge(&mut self, other: Attendance) {
        self.total += other.total;
        self.confirmed += other.confirmed;
        self.declined += other.declined;
        self.pending += other.pending;
    }

    /// Confirmed guests as a percentage of all guests, 0 for an empty list.
    pub fn confirmation_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.confirmed as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
