//! End-to-end tests for signup, login, logout and the admin guard
//!
//! Every request goes through the real router backed by the in-memory store,
//! so no database is needed.
//!
//! ## Running Tests
//! ```bash
//! cargo test -p petly-api --test auth_flow
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use petly_api::{
    auth::hash_password,
    create_router,
    store::{InMemoryUserStore, UserStore},
    AppState, Config,
};
use petly_shared::NewUser;
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Test Utilities
// ============================================================================

const SECRET: &str = "integration-session-secret-at-least-32-chars";

fn setup() -> (Router, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let state = AppState::new(Config::in_memory(SECRET), store.clone())
        .expect("Failed to build state");
    (create_router(state), store)
}

struct TestResponse {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    // Keep only `name=value` so it can be replayed as a Cookie header
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        cookie,
        body,
    }
}

async fn signup(app: &Router, username: &str, email: &str, password: &str) -> TestResponse {
    send(
        app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": password,
            "confirm_password": password,
        })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> TestResponse {
    send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_signup_logs_the_user_in() {
    let (app, store) = setup();

    let response = signup(&app, "alice", "alice@x.com", "secret1").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["username"], "alice");
    assert_eq!(response.body["user"]["is_admin"], false);
    assert!(response.body["user"].get("password_hash").is_none());

    let cookie = response.cookie.expect("signup sets a session cookie");
    assert!(cookie.starts_with("petly_session="));

    let profile = send(&app, "GET", "/profile", Some(&cookie), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["email"], "alice@x.com");

    let stored = store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].password_hash, "secret1");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let (app, store) = setup();
    signup(&app, "alice", "alice@x.com", "secret1").await;

    let response = signup(&app, "alice2", "alice@x.com", "secret2").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "VALIDATION_ERROR");
    assert!(response.body["error"]["fields"]["email"].is_array());
    assert!(response.cookie.is_none());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_invalid_signup_lists_every_field() {
    let (app, store) = setup();

    let response = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "username": "",
            "email": "not-an-email",
            "password": "123",
            "confirm_password": "456",
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = &response.body["error"]["fields"];
    for field in ["username", "email", "password", "confirm_password"] {
        assert!(fields[field].is_array(), "missing error for {}", field);
    }
    assert!(store.is_empty().await);
}

// ============================================================================
// Login / Logout
// ============================================================================

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let (app, _) = setup();
    signup(&app, "alice", "alice@x.com", "secret1").await;

    let wrong_password = login(&app, "alice@x.com", "nope").await;
    let unknown_email = login(&app, "nobody@x.com", "secret1").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert!(wrong_password.cookie.is_none());
    assert!(unknown_email.cookie.is_none());
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let (app, _) = setup();
    signup(&app, "alice", "alice@x.com", "secret1").await;

    let response = login(&app, "Alice@X.com", "secret1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["username"], "alice");
    assert!(response.body["expires_in"].as_i64().unwrap() > 0);
    assert!(response.cookie.is_some());
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (app, _) = setup();
    signup(&app, "alice", "alice@x.com", "secret1").await;
    let cookie = login(&app, "alice@x.com", "secret1").await.cookie.unwrap();

    let response = send(&app, "POST", "/logout", Some(&cookie), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cookie.as_deref(), Some("petly_session="));

    // The old cookie no longer opens protected pages
    let profile = send(&app, "GET", "/profile", Some(&cookie), None).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);

    let again = send(&app, "POST", "/logout", Some(&cookie), None).await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rotates_existing_session() {
    let (app, _) = setup();
    let first = signup(&app, "alice", "alice@x.com", "secret1").await.cookie.unwrap();

    let response = send(
        &app,
        "POST",
        "/login",
        Some(&first),
        Some(json!({ "email": "alice@x.com", "password": "secret1" })),
    )
    .await;
    let second = response.cookie.unwrap();
    assert_ne!(first, second);

    let stale = send(&app, "GET", "/profile", Some(&first), None).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    let fresh = send(&app, "GET", "/profile", Some(&second), None).await;
    assert_eq!(fresh.status, StatusCode::OK);
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let (app, _) = setup();

    for (method, uri) in [("GET", "/profile"), ("POST", "/logout"), ("GET", "/admin/dashboard")] {
        let response = send(&app, method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(response.body["error"]["code"], "UNAUTHORIZED");
    }

    let forged = send(&app, "GET", "/profile", Some("petly_session=abc.def"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let (app, store) = setup();
    let alice = signup(&app, "alice", "alice@x.com", "secret1").await.cookie.unwrap();

    let response = send(&app, "GET", "/admin/dashboard", Some(&alice), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"]["code"], "FORBIDDEN");

    store
        .create(NewUser::new("root", "root@x.com", hash_password("rootpass").unwrap()).admin())
        .await
        .unwrap();
    let admin = login(&app, "root@x.com", "rootpass").await.cookie.unwrap();

    let response = send(&app, "GET", "/admin/dashboard", Some(&admin), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);

    let users = response.body["users"].as_array().unwrap();
    let names: Vec<&str> = users
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", "root"]);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_malformed_bodies_use_the_error_format() {
    let (app, store) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // No JSON content type at all
    let response = send(&app, "POST", "/login", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "BAD_REQUEST");

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_routes_are_json_not_found() {
    let (app, _) = setup();

    let response = send(&app, "GET", "/no/such/page", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Availability checks and health
// ============================================================================

#[tokio::test]
async fn test_availability_checks() {
    let (app, _) = setup();
    signup(&app, "alice", "alice@x.com", "secret1").await;

    let cases = [
        ("/api/check_username", json!({ "username": "alice" }), true),
        ("/api/check_username", json!({ "username": "bob" }), false),
        ("/api/check_email", json!({ "email": "ALICE@x.com" }), true),
        ("/api/check_email", json!({ "email": "bob@x.com" }), false),
        ("/api/check_email", json!({ "value": "" }), false),
    ];

    for (uri, body, expected) in cases {
        let response = send(&app, "POST", uri, None, Some(body.clone())).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["exists"], expected, "{} {}", uri, body);
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = setup();

    let health = send(&app, "GET", "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    for uri in ["/health/live", "/health/ready"] {
        assert_eq!(send(&app, "GET", uri, None, None).await.status, StatusCode::OK);
    }
}
