use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use super::TestApp;

fn alice() -> serde_json::Value {
    json!({"name": "Alice", "email": "alice@example.com", "password": "hunter2"})
}

#[tokio::test]
async fn test_register_then_login_then_me() {
    let app = TestApp::new();

    let (status, registered) = app.post_json("/api/register", alice()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["user"]["name"], "Alice");
    assert_eq!(registered["user"]["email"], "alice@example.com");
    assert!(registered["user"].get("passwordHash").is_none());

    let (status, session) = app
        .post_json(
            "/api/login",
            json!({"email": "alice@example.com", "password": "hunter2"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["id"], registered["user"]["id"]);

    let token = session["token"].as_str().unwrap();
    let (status, claims) = app
        .get_with_token("/api/me", &format!("Bearer {token}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claims["id"], registered["user"]["id"]);
    assert_eq!(claims["email"], "alice@example.com");
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        7 * 24 * 60 * 60
    );
}

#[tokio::test]
async fn test_users_file_keeps_hash_not_password() {
    let app = TestApp::new();
    app.post_json("/api/register", alice()).await;

    let raw = std::fs::read_to_string(app.dir.path().join("users.json")).unwrap();
    let users: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["email"], "alice@example.com");
    assert!(users[0]["passwordHash"].as_str().unwrap().starts_with("$2"));
    assert!(!raw.contains("hunter2"));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = TestApp::new();
    app.post_json("/api/register", alice()).await;

    let (status, body) = app.post_json("/api/register", alice()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "email already in use"}));
}

#[tokio::test]
async fn test_registration_requires_email_and_password() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/register", json!({"email": "bob@example.com"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email and password required");
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::post("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.post_json("/api/register", alice()).await;

    let (wrong_status, wrong_body) = app
        .post_json(
            "/api/login",
            json!({"email": "alice@example.com", "password": "nope"}),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .post_json(
            "/api/login",
            json!({"email": "nobody@example.com", "password": "hunter2"}),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, json!({"error": "invalid credentials"}));
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn test_guard_rejects_missing_malformed_and_forged_tokens() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing auth token");

    let (status, body) = app.get_with_token("/api/me", "Token abc").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid auth header");

    let (status, body) = app
        .get_with_token("/api/me", "Bearer not.a.jwt")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let issuer = TestApp::with_config(|config| config.auth.jwt_secret = "other-secret".into());
    let (_, session) = issuer.post_json("/api/register", alice()).await;
    let token = session["token"].as_str().unwrap();

    let app = TestApp::new();
    let (status, body) = app
        .get_with_token("/api/me", &format!("Bearer {token}"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
}
