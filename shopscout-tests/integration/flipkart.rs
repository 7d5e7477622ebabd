use std::time::Duration;

use serde_json::json;
use shopscout_core::config::FlipkartConfig;
use shopscout_search::providers::FlipkartProvider;
use shopscout_search::{Price, ProductSearchProvider, SearchError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> FlipkartConfig {
    FlipkartConfig {
        affiliate_id: Some("aff-id".to_string()),
        affiliate_token: Some("aff-token".to_string()),
        base_url: server.uri(),
        ..FlipkartConfig::default()
    }
}

#[tokio::test]
async fn test_sends_affiliate_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/affiliate/search/json"))
        .and(query_param("query", "earbuds"))
        .and(query_param("resultCount", "10"))
        .and(header("Fk-Affiliate-Id", "aff-id"))
        .and(header("Fk-Affiliate-Token", "aff-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "productBaseInfoV1": {
                    "title": "Boat Airdopes",
                    "flipkartSellingPrice": {"amount": 1299},
                    "productUrl": "https://dl.flipkart.example/airdopes?affid=aff-id",
                    "imageUrls": ["https://img.flipkart.example/airdopes.jpg"]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = FlipkartProvider::new(reqwest::Client::new(), config(&server));
    let items = provider.search_products("earbuds").await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source, "flipkart");
    assert_eq!(items[0].title, "Boat Airdopes");
    assert_eq!(items[0].price, Some(Price::Amount(1299.0)));
}

#[tokio::test]
async fn test_non_array_container_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/affiliate/search/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": {"count": 0}})))
        .mount(&server)
        .await;

    let provider = FlipkartProvider::new(reqwest::Client::new(), config(&server));

    assert!(provider.search_products("earbuds").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/affiliate/search/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"products": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = FlipkartProvider::new(
        reqwest::Client::new(),
        FlipkartConfig {
            timeout: Duration::from_millis(50),
            ..config(&server)
        },
    );
    let err = provider.search_products("earbuds").await.unwrap_err();

    assert!(matches!(err, SearchError::NetworkError { provider: "flipkart", .. }));
}
