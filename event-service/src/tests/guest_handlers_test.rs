use axum::http::StatusCode;
use rust_xlsxwriter::Workbook;
use serde_json::json;
use tower::ServiceExt;

use super::test_app::{create_test_app, with_body};
use rsvp_shared::auth::create_test_request;
use rsvp_shared::models::{Guest, ResponseStatus};
use rsvp_shared::test_utils::http_test_utils::response_to_json;

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn guest_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let rows = [
        ("Name", "Email", "Phone"),
        ("Carla", "carla@example.com", "555-0102"),
        ("Dani", "not-an-email", ""),
        ("Ana Duplicate", "ana@example.com", ""),
    ];
    for (row, (name, email, phone)) in rows.iter().enumerate() {
        sheet.write_string(row as u32, 0, *name).unwrap();
        sheet.write_string(row as u32, 1, *email).unwrap();
        if !phone.is_empty() {
            sheet.write_string(row as u32, 2, *phone).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn test_add_guest() {
    let test = create_test_app().await;
    let event = test
        .seed_event(vec![Guest::new("Ana", "ana@example.com", None)])
        .await;
    let uri = format!("/events/{}/guests", event.id);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &uri,
            "organizer",
            Some(json!({ "name": "Bruno", "email": " Bruno@Example.com " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["email"], "bruno@example.com");
    assert_eq!(json_resp["status"], "pending");

    // Same address in a different case is a duplicate
    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &uri,
            "organizer",
            Some(json!({ "name": "Ana", "email": "ANA@example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &uri,
            "organizer",
            Some(json!({ "name": "Zed", "email": "zed-at-example" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(test.stored_event(&event.id).await.guests.len(), 2);
}

#[tokio::test]
async fn test_update_guest_status_and_notes() {
    let test = create_test_app().await;
    let event = test
        .seed_event(vec![
            Guest::new("Ana", "ana@example.com", None),
            Guest::new("Bruno", "bruno@example.com", None),
        ])
        .await;
    let uri = format!("/events/{}/guests/bruno@example.com", event.id);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &uri,
            "organizer",
            Some(json!({ "status": "confirmed", "notes": "Vegetarian" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = test.stored_event(&event.id).await;
    assert_eq!(stored.guests[0].status, ResponseStatus::Pending);
    assert_eq!(stored.guests[1].status, ResponseStatus::Confirmed);
    assert!(stored.guests[1].confirmed_at.is_some());
    assert_eq!(stored.guests[1].notes.as_deref(), Some("Vegetarian"));
    assert!(stored.guests[1].notes_updated_at.is_some());

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/events/{}/guests/nobody@example.com", event.id),
            "organizer",
            Some(json!({ "notes": "x" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_guest() {
    let test = create_test_app().await;
    let event = test
        .seed_event(vec![
            Guest::new("Ana", "ana@example.com", None),
            Guest::new("Bruno", "bruno@example.com", None),
        ])
        .await;

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "DELETE",
            &format!("/events/{}/guests/ANA@example.com", event.id),
            "organizer",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = test.stored_event(&event.id).await;
    assert_eq!(stored.guests.len(), 1);
    assert_eq!(stored.guests[0].email, "bruno@example.com");
}

#[tokio::test]
async fn test_import_preview_then_confirm() {
    let test = create_test_app().await;
    let event = test
        .seed_event(vec![Guest::new("Ana", "ana@example.com", None)])
        .await;

    let request = with_body(
        create_test_request(
            "POST",
            &format!("/events/{}/guests/import", event.id),
            "organizer",
            None,
        ),
        XLSX,
        guest_workbook(),
    );
    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let preview = response_to_json(response).await;
    // The preview only checks the file itself
    let guests = preview["guests"].as_array().unwrap();
    assert_eq!(guests.len(), 2);
    assert_eq!(guests[0]["email"], "carla@example.com");
    assert_eq!(preview["invalid"][0]["reason"], "invalid email");
    assert_eq!(test.stored_event(&event.id).await.guests.len(), 1);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/events/{}/guests/import/confirm", event.id),
            "organizer",
            Some(preview["guests"].clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = response_to_json(response).await;
    assert_eq!(result["added"].as_array().unwrap().len(), 1);
    assert_eq!(result["skipped"][0]["email"], "ana@example.com");
    assert_eq!(result["skipped"][0]["reason"], "already on the guest list");

    let stored = test.stored_event(&event.id).await;
    assert_eq!(stored.guests.len(), 2);
    assert_eq!(stored.guests[1].phone.as_deref(), Some("555-0102"));
}

#[tokio::test]
async fn test_import_rejects_non_spreadsheet() {
    let test = create_test_app().await;
    let event = test.seed_event(vec![]).await;

    let request = with_body(
        create_test_request(
            "POST",
            &format!("/events/{}/guests/import", event.id),
            "organizer",
            None,
        ),
        "text/csv",
        b"name,email\nAna,ana@example.com\n".to_vec(),
    );
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_invitations_to_pending_guests() {
    let test = create_test_app().await;
    let mut declined = Guest::new("Carla", "carla@example.com", None);
    declined.status = ResponseStatus::Declined;
    let event = test
        .seed_event(vec![
            Guest::new("Ana", "ana@example.com", None),
            Guest::new("Bruno", "bruno@example.com", None),
            declined,
        ])
        .await;
    test.mailer.fail_for("bruno@example.com").await;

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/events/{}/invitations", event.id),
            "organizer",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["sent"], json!(["ana@example.com"]));
    assert_eq!(json_resp["failed"][0]["email"], "bruno@example.com");

    let sent = test.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@example.com");
    assert!(sent[0].subject.contains("Company Anniversary"));

    let stored = test.stored_event(&event.id).await;
    assert!(stored.guests[0].invited_at.is_some());
    assert!(stored.guests[1].invited_at.is_none());
    assert!(stored.guests[2].invited_at.is_none());
}

#[tokio::test]
async fn test_send_invitations_to_selected_guests() {
    let test = create_test_app().await;
    let mut confirmed = Guest::new("Ana", "ana@example.com", None);
    confirmed.status = ResponseStatus::Confirmed;
    let event = test
        .seed_event(vec![confirmed, Guest::new("Bruno", "bruno@example.com", None)])
        .await;

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/events/{}/invitations", event.id),
            "organizer",
            Some(json!({ "emails": ["Ana@Example.com", "ghost@example.com"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["sent"], json!(["ana@example.com"]));
    assert_eq!(json_resp["failed"][0]["reason"], "not on the guest list");
    assert_eq!(test.mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn test_send_invitations_ignores_repeated_emails() {
    let test = create_test_app().await;
    let event = test
        .seed_event(vec![Guest::new("Ana", "ana@example.com", None)])
        .await;

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/events/{}/invitations", event.id),
            "organizer",
            Some(json!({
                "emails": ["ana@example.com", "ANA@example.com", " Ana@Example.com "]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["sent"], json!(["ana@example.com"]));
    assert_eq!(json_resp["failed"], json!([]));
    assert_eq!(test.mailer.sent().await.len(), 1);
}
