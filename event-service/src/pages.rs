//! HTML shown to guests who follow a response link.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use log::{error, info, warn};
use rsvp_shared::dispatch::escape_html;
use rsvp_shared::models::ResponseStatus;
use rsvp_shared::response::{Outcome, ResponseError};

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
  </head>
  <body style="font-family: Arial, sans-serif; background-color: #f8f9fa; color: #333; margin: 0; padding: 0;">
    <div style="max-width: 560px; margin: 40px auto; background: white; padding: 24px; border-radius: 10px;">
{body}
    </div>
  </body>
</html>"#,
        title = escape_html(title),
        body = body
    )
}

fn acknowledgment_parts(outcome: &Outcome) -> (&'static str, String) {
    let guest = escape_html(&outcome.guest.name);
    let event = escape_html(&outcome.event.name);
    let date = escape_html(&outcome.event.date);
    let time = escape_html(&outcome.event.time);
    let venue = escape_html(&outcome.event.venue);

    let (title, message) = match outcome.status {
        ResponseStatus::Confirmed => (
            "Attendance confirmed",
            format!(
                "Thank you, {}! Your attendance at <strong>{}</strong> is confirmed.",
                guest, event
            ),
        ),
        _ => (
            "Response recorded",
            format!(
                "Thank you for letting us know, {}. We are sorry you cannot attend <strong>{}</strong>.",
                guest, event
            ),
        ),
    };
    let already = if outcome.changed {
        ""
    } else {
        "\n      <p style=\"color: #666;\">We already had this answer on record.</p>"
    };

    let body = format!(
        r#"      <h2 style="color: #1a73e8;">{title}</h2>
      <p>{message}</p>{already}
      <p style="margin: 5px 0;"><strong>Date:</strong> {date}</p>
      <p style="margin: 5px 0;"><strong>Time:</strong> {time}</p>
      <p style="margin: 5px 0;"><strong>Venue:</strong> {venue}</p>"#
    );
    (title, body)
}

/// Confirmation of what was recorded for the guest.
pub fn acknowledgment(outcome: &Outcome) -> String {
    let (title, body) = acknowledgment_parts(outcome);
    layout(title, &body)
}

/// The decline acknowledgment plus a form to leave an optional reason.
pub fn decline_with_reason_form(outcome: &Outcome, action: &str) -> String {
    let (title, body) = acknowledgment_parts(outcome);
    let current = outcome
        .guest
        .decline_reason
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();
    let form = format!(
        r#"      <form method="post" action="{action}" style="margin-top: 20px;">
        <label for="reason">Would you like to tell us why? (optional)</label><br>
        <textarea id="reason" name="reason" rows="3" style="width: 100%;">{current}</textarea><br>
        <button type="submit">Send</button>
      </form>"#,
        action = escape_html(action),
        current = current
    );
    layout(title, &format!("{}\n{}", body, form))
}

fn error_details(err: &ResponseError) -> (StatusCode, &'static str) {
    match err {
        ResponseError::Malformed | ResponseError::InvalidSignature => {
            (StatusCode::BAD_REQUEST, "The link you followed is not valid.")
        }
        ResponseError::Expired => (
            StatusCode::GONE,
            "This link has expired. Please ask the organizer to send you a new invitation.",
        ),
        ResponseError::EventNotFound(_) | ResponseError::GuestNotFound { .. } => (
            StatusCode::NOT_FOUND,
            "We could not find the invitation this link refers to.",
        ),
        ResponseError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong on our side. Please try again later.",
        ),
    }
}

/// Neutral page for any failed response. The cause is only logged.
pub fn error_page(err: &ResponseError) -> (StatusCode, String) {
    let (status, hint) = error_details(err);
    let html = layout(
        "We could not process your response",
        &format!(
            r#"      <h2 style="color: #dc3545;">We could not process your response</h2>
      <p>{}</p>"#,
            hint
        ),
    );
    (status, html)
}

/// Wraps a response failure so handlers can return it with `?`.
#[derive(Debug)]
pub struct ResponsePageError(pub ResponseError);

impl From<ResponseError> for ResponsePageError {
    fn from(err: ResponseError) -> Self {
        ResponsePageError(err)
    }
}

impl IntoResponse for ResponsePageError {
    fn into_response(self) -> Response {
        let (status, html) = error_page(&self.0);
        if status.is_server_error() {
            error!("Guest response failed: {}", self.0);
        } else if status == StatusCode::GONE {
            info!("Guest followed an expired link");
        } else {
            warn!("Guest response rejected: {}", self.0);
        }
        (status, Html(html)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_shared::models::Guest;
    use rsvp_shared::store::StoreError;
    use rsvp_shared::test_utils::mock_event_store::sample_event;

    fn outcome(status: ResponseStatus, changed: bool) -> Outcome {
        let mut guest = Guest::new("Ana <admin>", "ana@example.com", None);
        guest.status = status;
        Outcome {
            event: sample_event(vec![guest.clone()]),
            guest,
            status,
            changed,
        }
    }

    #[test]
    fn test_acknowledgment_escapes_guest_name() {
        let html = acknowledgment(&outcome(ResponseStatus::Confirmed, true));
        assert!(html.contains("Ana &lt;admin&gt;"));
        assert!(html.contains("Company Anniversary"));
        assert!(!html.contains("already had this answer"));

        let repeat = acknowledgment(&outcome(ResponseStatus::Confirmed, false));
        assert!(repeat.contains("already had this answer"));
    }

    #[test]
    fn test_decline_page_has_reason_form() {
        let html = decline_with_reason_form(
            &outcome(ResponseStatus::Declined, true),
            "/respond/decline/abc",
        );
        assert!(html.contains(r#"action="/respond/decline/abc""#));
        assert!(html.contains(r#"name="reason""#));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_reason_form_sits_inside_page_container() {
        let mut declined = outcome(ResponseStatus::Declined, false);
        declined.guest.decline_reason = Some("Out of <town>".to_string());
        let html = decline_with_reason_form(&declined, "/respond/decline/a\"b");

        let form = html.find("<form").unwrap();
        let venue = html.find("<strong>Venue:</strong>").unwrap();
        let container_end = html.rfind("    </div>").unwrap();
        assert!(venue < form && form < container_end);
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
        assert_eq!(html.matches("</form>").count(), 1);
        assert!(html.contains("already had this answer"));
        assert!(html.contains(">Out of &lt;town&gt;</textarea>"));
        assert!(html.contains(r#"action="/respond/decline/a&quot;b""#));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ResponseError::Malformed, StatusCode::BAD_REQUEST),
            (ResponseError::InvalidSignature, StatusCode::BAD_REQUEST),
            (ResponseError::Expired, StatusCode::GONE),
            (ResponseError::EventNotFound("e".into()), StatusCode::NOT_FOUND),
            (
                ResponseError::GuestNotFound {
                    event_id: "e".into(),
                    email: "x@y.z".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ResponseError::Store(StoreError::Dynamo("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, html) = error_page(&err);
            assert_eq!(status, expected);
            assert!(html.contains("We could not process your response"));
            assert!(!html.contains("boom"));
        }
    }
}
