use serde_json::json;
use shopscout_core::config::SourcesConfig;
use shopscout_search::{Price, ProductAggregator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sources(serpapi: &MockServer, flipkart: &MockServer) -> SourcesConfig {
    let mut config = SourcesConfig::default();
    config.serpapi.api_key = Some("serp-key".to_string());
    config.serpapi.base_url = serpapi.uri();
    config.flipkart.affiliate_id = Some("aff-id".to_string());
    config.flipkart.affiliate_token = Some("aff-token".to_string());
    config.flipkart.base_url = flipkart.uri();
    config
}

#[tokio::test]
async fn test_merges_sources_by_price_with_affiliate_precedence() {
    let serpapi = MockServer::start().await;
    let flipkart = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shopping_results": [
                {"source": "Croma", "title": "Phone", "price": "₹9,999", "link": "https://shop.example/phone?src=serp"},
                {"source": "Croma", "title": "Case", "price": "₹299", "link": "https://croma.example/case"},
                {"source": "Croma", "title": "Charger", "link": "https://croma.example/charger"}
            ]
        })))
        .mount(&serpapi)
        .await;
    Mock::given(method("GET"))
        .and(path("/affiliate/search/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"title": "Phone", "price": 10499, "url": "https://shop.example/phone?src=fk"}]
        })))
        .mount(&flipkart)
        .await;

    let aggregator = ProductAggregator::from_config(&sources(&serpapi, &flipkart));
    let result = aggregator.aggregate("phone").await;

    let summary: Vec<(&str, Option<f64>)> = result
        .results
        .iter()
        .map(|item| (item.source.as_str(), item.amount()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Croma", Some(299.0)),
            ("flipkart", Some(10499.0)),
            ("Croma", None),
        ]
    );
    assert_eq!(result.results[0].price, Some(Price::Amount(299.0)));
}

#[tokio::test]
async fn test_upstream_outage_only_removes_that_source() {
    let serpapi = MockServer::start().await;
    let flipkart = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shopping_results": [{"source": "Croma", "title": "Phone", "link": "https://croma.example/p"}]
        })))
        .mount(&serpapi)
        .await;
    Mock::given(method("GET"))
        .and(path("/affiliate/search/json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&flipkart)
        .await;

    let aggregator = ProductAggregator::from_config(&sources(&serpapi, &flipkart));
    let result = aggregator.aggregate("phone").await;

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].source, "Croma");
}
