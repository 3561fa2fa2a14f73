use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::routes;
use crate::state::AppState;
use patitas_infra::config::AppConfig;

#[derive(Serialize)]
struct Claims {
    sub: String,
    role: String,
    exp: usize,
}

fn test_config() -> AppConfig {
    AppConfig {
        app_env: "test".to_string(),
        port: 0,
        log_level: "info".to_string(),
        cors_allowed_origin: "http://localhost:4200".to_string(),
        frontend_url: "http://localhost:4200".to_string(),
        data_backend: "memory".to_string(),
        surreal_endpoint: "ws://127.0.0.1:8000".to_string(),
        surreal_ns: "patitas".to_string(),
        surreal_db: "marketplace".to_string(),
        surreal_user: "root".to_string(),
        surreal_pass: "root".to_string(),
        jwt_secret: "test-secret".to_string(),
        auth_dev_bypass_enabled: false,
        media_upload_url: "http://127.0.0.1:1/image/upload".to_string(),
        media_api_key: String::new(),
        media_api_secret: String::new(),
        media_folder: "patitas/test".to_string(),
        media_timeout_ms: 500,
        mail_enabled: false,
        mail_relay_url: "http://127.0.0.1:1/send".to_string(),
        mail_relay_token: String::new(),
        mail_from: "Patitas <no-reply@patitas.test>".to_string(),
        mail_timeout_ms: 500,
    }
}

fn test_router() -> Router {
    routes::router(AppState::in_memory(test_config()))
}

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        exp: 4_000_000_000,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap_or_default()
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn dog_payload(name: &str) -> Value {
    json!({
        "name": name,
        "size": "medium",
        "gender": "male",
        "description": "friendly and calm",
        "is_vaccinated": true,
        "is_sterilized": false,
    })
}

fn adoption_payload(dog_id: &str) -> Value {
    json!({
        "dog_id": dog_id,
        "message": "I would love to adopt",
        "has_experience": true,
        "has_other_pets": false,
        "has_yard": true,
        "reason_for_adoption": "lifelong dog household",
    })
}

async fn create_dog(app: &Router, rescuer_token: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/dogs",
        Some(rescuer_token),
        Some(dog_payload("Rocky")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["dog_id"].as_str().expect("dog id").to_string()
}

async fn dog_status(app: &Router, dog_id: &str) -> String {
    let (status, body) = send_json(app, "GET", &format!("/api/dogs/{dog_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["status"].as_str().expect("dog status").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_router();
    let (status, body) = send_json(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn protected_routes_reject_anonymous_callers() {
    let app = test_router();
    let (status, body) = send_json(&app, "GET", "/api/adoptions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn dogs_listing_is_public_but_publishing_is_not() {
    let app = test_router();
    let (status, body) = send_json(&app, "GET", "/api/dogs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    let adopter = token("adopter-1", "adopter");
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/dogs",
        Some(&adopter),
        Some(dog_payload("Rocky")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn adoption_flow_approve_then_complete() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;
    assert_eq!(dog_status(&app, &dog_id).await, "available");

    let (status, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    assert_eq!(request["rescuer_id"], "rescuer-1");
    // The dog stays listed until the rescuer acts.
    assert_eq!(dog_status(&app, &dog_id).await, "available");
    let request_id = request["request_id"].as_str().expect("request id");

    // A second submission for the same pair is blocked by the check.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "conflict: already pending");

    let (status, approved) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/status"),
        Some(&rescuer),
        Some(json!({"status": "approved", "response_message": "come meet him"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(dog_status(&app, &dog_id).await, "in_process");

    let (status, completed) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/status"),
        Some(&rescuer),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert_eq!(dog_status(&app, &dog_id).await, "adopted");

    let (status, mine) = send_json(&app, "GET", "/api/adoptions", Some(&adopter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn lifecycle_mutations_leave_an_audit_trail() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let stranger = token("stranger-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;

    let (_, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    let request_id = request["request_id"].as_str().expect("request id").to_string();

    send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/status"),
        Some(&rescuer),
        Some(json!({"status": "approved", "response_message": "come meet him"})),
    )
    .await;

    // Appends are fire-and-forget; poll until both have landed.
    let audit_uri = format!("/api/adoptions/{request_id}/audit");
    let mut entries = Value::Null;
    for _ in 0..50 {
        let (status, body) = send_json(&app, "GET", &audit_uri, Some(&adopter), None).await;
        assert_eq!(status, StatusCode::OK);
        if body.as_array().map(Vec::len) == Some(2) {
            entries = body;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let entries = entries.as_array().expect("two audit entries");
    assert_eq!(entries[0]["action"], "request_created");
    assert_eq!(entries[0]["actor_id"], "adopter-1");
    assert_eq!(entries[1]["action"], "request_approved");
    assert_eq!(entries[1]["actor_id"], "rescuer-1");
    assert_eq!(entries[1]["detail"], "come meet him");

    let (status, _) = send_json(&app, "GET", &audit_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn skipping_approval_is_rejected_with_invalid_transition() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;

    let (_, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    let request_id = request["request_id"].as_str().expect("request id");

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/status"),
        Some(&rescuer),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_transition");
    assert_eq!(dog_status(&app, &dog_id).await, "available");
}

#[tokio::test]
async fn cancel_flow_triggers_cooldown() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;

    let (_, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    let request_id = request["request_id"].as_str().expect("request id");

    let (status, cancelled) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/cancel"),
        Some(&adopter),
        Some(json!({"reason": "changed my mind"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled_by_adopter");
    assert_eq!(cancelled["cancellation_reason"], "changed my mind");
    assert!(cancelled["cancelled_at_ms"].is_i64());
    assert_eq!(dog_status(&app, &dog_id).await, "available");

    let (status, cooldown) = send_json(
        &app,
        "GET",
        &format!("/api/adoptions/cooldown?dog_id={dog_id}"),
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cooldown["in_cooldown"], true);
    let remaining = cooldown["days_remaining"].as_i64().expect("days remaining");
    assert!((1..=7).contains(&remaining));

    // Re-requesting inside the window is blocked: the pair already has a
    // cancelled request, which keeps blocking with the cooldown reason.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "conflict: previously cancelled, cooldown applies"
    );

    let (status, check) = send_json(
        &app,
        "GET",
        &format!("/api/adoptions/check?dog_id={dog_id}"),
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["exists"], true);
    assert_eq!(
        check["blocking_reason"],
        "previously cancelled, cooldown applies"
    );
}

#[tokio::test]
async fn only_the_owning_parties_drive_the_lifecycle() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let stranger = token("stranger-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;

    let (_, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    let request_id = request["request_id"].as_str().expect("request id");

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/status"),
        Some(&stranger),
        Some(json!({"status": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/adoptions/{request_id}/cancel"),
        Some(&rescuer),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/adoptions/{request_id}"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messaging_round_trip_with_unread_tracking() {
    let app = test_router();
    let adopter = token("adopter-1", "adopter");
    let rescuer = token("rescuer-1", "rescuer");

    let (status, message) = send_json(
        &app,
        "POST",
        "/api/messages",
        Some(&adopter),
        Some(json!({"receiver_id": "rescuer-1", "body": "hola, sigue disponible?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = message["message_id"].as_str().expect("message id");

    let (status, unread) =
        send_json(&app, "GET", "/api/messages/unread-count", Some(&rescuer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread["unread"], 1);

    let (status, conversations) =
        send_json(&app, "GET", "/api/messages/conversations", Some(&rescuer), None).await;
    assert_eq!(status, StatusCode::OK);
    let conversations = conversations.as_array().expect("conversations array");
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["user_id"], "adopter-1");
    assert_eq!(conversations[0]["unread_count"], 1);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/messages/mark-read",
        Some(&rescuer),
        Some(json!({"message_ids": [message_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, unread) =
        send_json(&app, "GET", "/api/messages/unread-count", Some(&rescuer), None).await;
    assert_eq!(unread["unread"], 0);

    let (status, thread) = send_json(
        &app,
        "GET",
        "/api/messages/with/adopter-1",
        Some(&rescuer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn favorites_toggle_and_count() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;

    let (status, toggled) = send_json(
        &app,
        "POST",
        &format!("/api/favorites/{dog_id}/toggle"),
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_favorite"], true);

    let (status, count) = send_json(
        &app,
        "GET",
        &format!("/api/favorites/{dog_id}/count"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 1);

    let (_, favorites) = send_json(&app, "GET", "/api/favorites", Some(&adopter), None).await;
    assert_eq!(favorites.as_array().map(Vec::len), Some(1));

    let (_, toggled) = send_json(
        &app,
        "POST",
        &format!("/api/favorites/{dog_id}/toggle"),
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(toggled["is_favorite"], false);
}

#[tokio::test]
async fn profile_complete_is_single_shot() {
    let app = test_router();
    let adopter = token("adopter-1", "adopter");
    let payload = json!({
        "email": "ana@example.com",
        "first_name": "Ana",
        "last_name": "Rojas",
        "role": "adopter",
        "has_yard": true,
    });

    let (status, profile) = send_json(
        &app,
        "POST",
        "/api/profiles/complete",
        Some(&adopter),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["email"], "ana@example.com");

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/profiles/complete",
        Some(&adopter),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, public) =
        send_json(&app, "GET", "/api/profiles/adopter-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["first_name"], "Ana");
}

#[tokio::test]
async fn notification_preferences_default_and_update() {
    let app = test_router();
    let adopter = token("adopter-1", "adopter");

    let (status, preferences) = send_json(
        &app,
        "GET",
        "/api/notifications/preferences",
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preferences["messages"], true);
    assert_eq!(preferences["new_dogs"], true);

    let (status, updated) = send_json(
        &app,
        "PUT",
        "/api/notifications/preferences",
        Some(&adopter),
        Some(json!({"messages": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["messages"], false);
    assert_eq!(updated["new_dogs"], true);
}

#[tokio::test]
async fn rescuer_stats_reflect_catalog_and_requests() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");
    let dog_id = create_dog(&app, &rescuer).await;
    send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;

    let (status, stats) = send_json(&app, "GET", "/api/stats/rescuer", Some(&rescuer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_dogs"], 1);
    assert_eq!(stats["available_dogs"], 1);
    assert_eq!(stats["pending_requests"], 1);

    let (status, stats) = send_json(
        &app,
        "GET",
        &format!("/api/stats/dogs/{dog_id}"),
        Some(&rescuer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["request_count"], 1);
}

#[tokio::test]
async fn upload_without_media_credentials_is_a_client_error() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let boundary = "patitas-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"rocky.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         not-really-a-jpeg\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload/single")
        .header(header::AUTHORIZATION, format!("Bearer {rescuer}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("build request");

    let response = app.oneshot(request).await.expect("router response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    assert_eq!(value["error"]["code"], "validation_error");
}

#[tokio::test]
async fn followup_schedule_requires_an_existing_request() {
    let app = test_router();
    let rescuer = token("rescuer-1", "rescuer");
    let adopter = token("adopter-1", "adopter");

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/followups/schedule",
        Some(&adopter),
        Some(json!({"adoption_request_id": "missing", "adoption_date_ms": 1_000})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let dog_id = create_dog(&app, &rescuer).await;
    let (_, request) = send_json(
        &app,
        "POST",
        "/api/adoptions",
        Some(&adopter),
        Some(adoption_payload(&dog_id)),
    )
    .await;
    let request_id = request["request_id"].as_str().expect("request id");

    let (status, scheduled) = send_json(
        &app,
        "POST",
        "/api/followups/schedule",
        Some(&adopter),
        Some(json!({
            "adoption_request_id": request_id,
            "adoption_date_ms": 1_700_000_000_000i64,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(scheduled.as_array().map(Vec::len), Some(3));

    let (status, pending) = send_json(
        &app,
        "GET",
        "/api/followups/pending",
        Some(&adopter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().map(Vec::len), Some(3));
}
