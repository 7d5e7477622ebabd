use serde_json::json;
use shopscout_core::config::SerpApiConfig;
use shopscout_search::providers::SerpApiProvider;
use shopscout_search::{Price, ProductSearchProvider, SearchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> SerpApiProvider {
    SerpApiProvider::new(
        reqwest::Client::new(),
        SerpApiConfig {
            api_key: Some("serp-key".to_string()),
            base_url: server.uri(),
            ..SerpApiConfig::default()
        },
    )
}

#[tokio::test]
async fn test_sends_google_shopping_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("engine", "google_shopping"))
        .and(query_param("q", "pixel 9"))
        .and(query_param("api_key", "serp-key"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shopping_results": [
                {
                    "source": "Croma",
                    "title": "Pixel 9",
                    "price": "₹79,999.00",
                    "link": "https://croma.example/pixel-9"
                },
                {"shop": "Reliance", "title": "Pixel 9 Pro", "extracted_price": 99999}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider(&server).search_products("pixel 9").await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].source, "Croma");
    assert_eq!(items[0].price, Some(Price::Text("₹79,999.00".to_string())));
    assert_eq!(items[1].source, "Reliance");
    assert_eq!(items[1].price, Some(Price::Amount(99999.0)));
}

#[tokio::test]
async fn test_missing_results_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search_metadata": {}})))
        .mount(&server)
        .await;

    let items = provider(&server).search_products("anything").await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})))
        .mount(&server)
        .await;

    let err = provider(&server).search_products("phone").await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::UpstreamStatus {
            provider: "serpapi",
            status: 401
        }
    ));
}

#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = provider(&server).search_products("phone").await.unwrap_err();

    assert!(matches!(err, SearchError::ParseError { .. }));
}
