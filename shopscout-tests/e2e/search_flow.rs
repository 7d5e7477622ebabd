use axum::http::StatusCode;
use serde_json::json;

use super::TestApp;

#[tokio::test]
async fn test_search_without_sources_is_empty() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/search?q=phone").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"query": "phone", "results": []}));
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new();

    for uri in ["/api/search", "/api/search?q="] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({"error": "query param q required"}));
    }
}

#[tokio::test]
async fn test_gated_search_requires_token() {
    let app = TestApp::with_config(|config| config.auth.search_requires_auth = true);

    let (status, body) = app.get("/api/search?q=phone").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing auth token");

    let (_, session) = app
        .post_json(
            "/api/register",
            json!({"email": "carol@example.com", "password": "pw"}),
        )
        .await;
    let token = session["token"].as_str().unwrap();
    let (status, body) = app
        .get_with_token("/api/search?q=phone", &format!("Bearer {token}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "phone");
}

#[tokio::test]
async fn test_sources_report_configuration() {
    let app = TestApp::with_config(|config| {
        config.sources.serpapi.api_key = Some("key".to_string());
    });

    let (status, body) = app.get("/api/sources").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"sources": [
            {"name": "flipkart", "enabled": false},
            {"name": "ajio", "enabled": false},
            {"name": "serpapi", "enabled": true}
        ]})
    );
}

#[tokio::test]
async fn test_client_routes_fall_back_to_index() {
    let app = TestApp::new();
    let public = app.dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("index.html"), "<title>Shopscout</title>").unwrap();
    std::fs::write(public.join("app.js"), "console.log('ok')").unwrap();

    let (status, body) = app.get("/results/phone").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("<title>Shopscout</title>"));

    let (status, body) = app.get("/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("console.log('ok')"));
}
