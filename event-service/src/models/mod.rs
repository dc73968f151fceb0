use rsvp_shared::models::{Attendance, Event, ResponseStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

// Request DTOs
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 3, message = "name must have at least 3 characters"))]
    pub name: String,
    #[validate(length(min = 2, message = "responsible must have at least 2 characters"))]
    pub responsible: String,
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    #[validate(length(min = 1, message = "time is required"))]
    pub time: String,
    #[validate(length(min = 3, message = "venue must have at least 3 characters"))]
    pub venue: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default)]
    #[validate(nested)]
    pub guests: Vec<NewGuestRequest>,
}

#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 3))]
    pub name: Option<String>,
    #[validate(length(min = 2))]
    pub responsible: Option<String>,
    #[validate(length(min = 1))]
    pub date: Option<String>,
    #[validate(length(min = 1))]
    pub time: Option<String>,
    #[validate(length(min = 3))]
    pub venue: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub capacity: Option<u32>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.responsible.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.venue.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.capacity.is_none()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct NewGuestRequest {
    #[validate(length(min = 1, message = "guest name is required"))]
    pub name: String,
    #[validate(email(message = "guest email is invalid"))]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateGuestRequest {
    pub status: Option<ResponseStatus>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SendInvitationsRequest {
    /// Specific guests to (re)invite. Without it every pending guest is invited.
    pub emails: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct DeclineForm {
    pub reason: Option<String>,
}

// Response DTOs
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    pub responsible: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub attendance: Attendance,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            name: event.name.clone(),
            responsible: event.responsible.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            venue: event.venue.clone(),
            category: event.category.clone(),
            status: event.status.clone(),
            attendance: event.attendance(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RejectedGuest {
    pub name: Option<String>,
    pub email: String,
    pub reason: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
