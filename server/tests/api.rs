use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Days, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use carmeet_server::config::Config;
use carmeet_server::routes::create_routes;
use carmeet_server::services::permissions;
use carmeet_server::state::AppState;
use carmeet_server::store::SqliteStore;

async fn test_app() -> (Router, AppState) {
    let store = SqliteStore::in_memory().await.unwrap();
    let state = AppState::new(Arc::new(store), Config::default());
    (create_routes(state.clone()), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// Registers `username` and logs in, returning the `session=...` cookie pair.
async fn sign_up(app: &Router, username: &str) -> String {
    let (status, _, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
            "first_name": "Test",
            "last_name": "Driver",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, headers, _) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn sign_up_admin(app: &Router, state: &AppState, username: &str) -> String {
    let cookie = sign_up(app, username).await;
    permissions::grant_admin(state.store(), username).await.unwrap();
    cookie
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app().await;
    let (status, headers, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "carmeet-api");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_login_sets_session_cookie_and_me_requires_it() {
    let (app, _) = test_app().await;

    let (status, _, body) = send(&app, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let cookie = sign_up(&app, "kit").await;
    assert!(cookie.starts_with("session="));

    let (status, _, body) = send(&app, Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "kit");
    assert_eq!(body["data"]["role"], "member");
    assert!(body["data"].get("password_hash").is_none());

    let (status, _, _) = send(&app, Method::POST, "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let (app, _) = test_app().await;
    sign_up(&app, "kit").await;

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "kit", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid username or password");
    assert!(!headers.contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn test_admin_routes_are_forbidden_to_members() {
    let (app, state) = test_app().await;
    let member = sign_up(&app, "plain").await;

    let (status, _, body) = send(&app, Method::GET, "/api/members", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // capabilities are re-read on every request, so the grant applies to the live session
    permissions::grant_admin(state.store(), "plain").await.unwrap();
    let (status, _, body) = send(&app, Method::GET, "/api/members", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_license_plate_conflicts() {
    let (app, state) = test_app().await;
    let admin = sign_up_admin(&app, &state, "boss").await;

    let vehicle = |plate: &str| {
        json!({
            "make": "Mazda",
            "model": "MX-5",
            "year": 1991,
            "color": "Red",
            "license_plate": plate,
        })
    };

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/vehicles",
        Some(&admin),
        Some(vehicle("abc 123")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["license_plate"], "ABC 123");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/vehicles",
        Some(&admin),
        Some(vehicle("ABC 123")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "License plate already registered");
}

#[tokio::test]
async fn test_ticket_purchase_scan_and_rescan() {
    let (app, state) = test_app().await;
    let admin = sign_up_admin(&app, &state, "boss").await;

    let (status, _, place) = send(
        &app,
        Method::POST,
        "/api/places",
        Some(&admin),
        Some(json!({ "name": "Lot B", "address": "1 Main St", "type": "parking" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let next_week = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(7))
        .unwrap();
    let (status, _, event) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(&admin),
        Some(json!({
            "title": "Night meet",
            "description": "Bring snacks",
            "place_id": place["data"]["id"],
            "event_date": next_week,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["data"]["location"], "Lot B - 1 Main St");

    let (status, _, ticket) = send(
        &app,
        Method::POST,
        "/api/tickets",
        None,
        Some(json!({ "event_id": event["data"]["id"], "buyer_name": "Sam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ticket_id = ticket["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(ticket["data"]["status"], "valid");
    assert_eq!(
        ticket["data"]["qr_code_url"],
        format!("/api/tickets/{ticket_id}/qr")
    );

    let scan = json!({ "ticket_id": format!("TICKET:{}", ticket_id.to_lowercase()) });
    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/tickets/scan",
        Some(&admin),
        Some(scan.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["buyer_name"], "Sam");
    assert_eq!(body["data"]["event_name"], "Night meet");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/tickets/scan",
        Some(&admin),
        Some(scan),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "TICKET_ALREADY_USED");
    assert_eq!(body["error"]["details"]["ticket"]["id"], ticket_id.as_str());
}

#[tokio::test]
async fn test_scan_requires_login_and_rejects_garbage() {
    let (app, _) = test_app().await;
    let body = json!({ "ticket_id": "ABCDEF12" });

    let (status, _, _) = send(&app, Method::POST, "/api/tickets/scan", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = sign_up(&app, "door").await;
    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/tickets/scan",
        Some(&cookie),
        Some(json!({ "ticket_id": "not a ticket" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_TICKET_ID");
}

#[tokio::test]
async fn test_qr_code_is_an_uncached_png_download() {
    let (app, state) = test_app().await;
    let admin = sign_up_admin(&app, &state, "boss").await;

    let (_, _, place) = send(
        &app,
        Method::POST,
        "/api/places",
        Some(&admin),
        Some(json!({ "name": "Dock", "address": "2 Pier Rd", "type": "parking" })),
    )
    .await;
    let (_, _, event) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(&admin),
        Some(json!({
            "title": "Dockside",
            "description": "Sunset run",
            "place_id": place["data"]["id"],
            "event_date": Utc::now().date_naive(),
        })),
    )
    .await;
    let (_, _, ticket) = send(
        &app,
        Method::POST,
        "/api/tickets",
        None,
        Some(json!({ "event_id": event["data"]["id"] })),
    )
    .await;
    let ticket_id = ticket["data"]["id"].as_str().unwrap();

    let (status, headers, _) = send(
        &app,
        Method::GET,
        &format!("/api/tickets/{ticket_id}/qr"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=ticket_{ticket_id}.png").as_str()
    );
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let (app, _) = test_app().await;
    let cookie = sign_up(&app, "door").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/tickets/scan",
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _, body) = send(&app, Method::GET, "/api/events/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
