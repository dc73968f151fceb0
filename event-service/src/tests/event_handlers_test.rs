use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::test_app::create_test_app;
use rsvp_shared::auth::create_test_request;
use rsvp_shared::models::Guest;
use rsvp_shared::test_utils::http_test_utils::response_to_json;

#[tokio::test]
async fn test_create_event() {
    let test = create_test_app().await;

    let payload = json!({
        "name": "Summer Party",
        "responsible": "Joana",
        "date": "2030-01-15",
        "time": "18:30",
        "venue": "Rooftop Bar",
        "description": "  ",
        "guests": [
            { "name": "Ana", "email": "Ana@Example.com" },
            { "name": "Bruno", "email": "bruno@example.com", "phone": "555-0101" }
        ]
    });

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("POST", "/events", "organizer", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    let id = json_resp["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(json_resp["description"].is_null());
    assert_eq!(json_resp["guests"][0]["email"], "ana@example.com");
    assert_eq!(json_resp["guests"][0]["status"], "pending");
    assert_eq!(json_resp["guests"][1]["phone"], "555-0101");

    let stored = test.stored_event(id).await;
    assert_eq!(stored.name, "Summer Party");
    assert_eq!(stored.guests.len(), 2);
}

#[tokio::test]
async fn test_create_event_with_empty_description() {
    let test = create_test_app().await;

    let payload = json!({
        "name": "Summer Party",
        "responsible": "Joana",
        "date": "2030-01-15",
        "time": "18:30",
        "venue": "Rooftop Bar",
        "description": ""
    });
    let response = test
        .app
        .clone()
        .oneshot(create_test_request("POST", "/events", "organizer", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert!(json_resp["description"].is_null());
    let stored = test.stored_event(json_resp["id"].as_str().unwrap()).await;
    assert_eq!(stored.description, None);
}

#[tokio::test]
async fn test_create_event_validation() {
    let test = create_test_app().await;

    let too_short = json!({
        "name": "X",
        "responsible": "Joana",
        "date": "2030-01-15",
        "time": "18:30",
        "venue": "Rooftop Bar"
    });
    let response = test
        .app
        .clone()
        .oneshot(create_test_request("POST", "/events", "organizer", Some(too_short)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let duplicate_guests = json!({
        "name": "Summer Party",
        "responsible": "Joana",
        "date": "2030-01-15",
        "time": "18:30",
        "venue": "Rooftop Bar",
        "guests": [
            { "name": "Ana", "email": "ana@example.com" },
            { "name": "Ana Again", "email": "ANA@example.com" }
        ]
    });
    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/events",
            "organizer",
            Some(duplicate_guests),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_events_includes_attendance() {
    let test = create_test_app().await;
    let mut confirmed = Guest::new("Ana", "ana@example.com", None);
    confirmed.status = rsvp_shared::models::ResponseStatus::Confirmed;
    test.seed_event(vec![confirmed, Guest::new("Bruno", "b@example.com", None)])
        .await;

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("GET", "/events", "organizer", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    let events = json_resp["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["attendance"]["total"], 2);
    assert_eq!(events[0]["attendance"]["confirmed"], 1);
    assert_eq!(events[0]["attendance"]["pending"], 1);
}

#[tokio::test]
async fn test_get_update_delete_event() {
    let test = create_test_app().await;
    let event = test.seed_event(vec![]).await;
    let uri = format!("/events/{}", event.id);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("GET", &uri, "organizer", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_to_json(response).await["name"], "Company Anniversary");

    let response = test
        .app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &uri,
            "organizer",
            Some(json!({ "venue": "Town Hall", "description": "" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["venue"], "Town Hall");
    assert!(json_resp["description"].is_null());
    assert_eq!(json_resp["name"], "Company Anniversary");

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("PATCH", &uri, "organizer", Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("DELETE", &uri, "organizer", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(create_test_request("GET", &uri, "organizer", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_event_is_not_found() {
    let test = create_test_app().await;

    for (method, body) in [("GET", None), ("DELETE", None), ("PATCH", Some(json!({ "name": "Renamed" })))] {
        let response = test
            .app
            .clone()
            .oneshot(create_test_request(method, "/events/missing", "organizer", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} /events/missing", method);
    }
}
