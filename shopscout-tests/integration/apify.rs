use std::time::Duration;

use serde_json::json;
use shopscout_core::config::ApifyConfig;
use shopscout_search::providers::ApifyProvider;
use shopscout_search::{ProductSearchProvider, SearchError};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUNS: &str = "/v2/acts/test~actor/runs";
const RUN: &str = "/v2/acts/test~actor/runs/run-1";

fn provider(server: &MockServer, max_polls: u32) -> ApifyProvider {
    ApifyProvider::new(
        reqwest::Client::new(),
        ApifyConfig {
            token: Some("apify-token".to_string()),
            base_url: server.uri(),
            actor_id: "test~actor".to_string(),
            poll_interval: Duration::from_millis(5),
            max_polls,
            ..ApifyConfig::default()
        },
    )
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(RUNS))
        .and(query_param("token", "apify-token"))
        .and(body_json(json!({"searchQuery": "kurta"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "run-1"}})))
        .expect(1)
        .mount(server)
        .await;
}

fn run_status(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {"id": "run-1", "status": status, "defaultDatasetId": "ds-1"}
    }))
}

#[tokio::test]
async fn test_polls_until_success_then_reads_dataset() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(RUN))
        .respond_with(run_status("RUNNING"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RUN))
        .respond_with(run_status("SUCCEEDED"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/datasets/ds-1/items"))
        .and(query_param("token", "apify-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "Cotton Kurta", "price": 899, "url": "https://ajio.example/kurta"},
            {"name": "Linen Kurta", "final_price": "Rs. 1,499", "product_link": "https://ajio.example/linen"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider(&server, 20).search_products("kurta").await.unwrap();

    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Cotton Kurta", "Linen Kurta"]);
    assert!(items.iter().all(|i| i.source == "ajio"));
}

#[tokio::test]
async fn test_unfinished_run_gives_up_after_poll_budget() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(RUN))
        .respond_with(run_status("RUNNING"))
        .expect(3)
        .mount(&server)
        .await;

    let items = provider(&server, 3).search_products("kurta").await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_failed_run_stops_polling() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(RUN))
        .respond_with(run_status("FAILED"))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider(&server, 20).search_products("kurta").await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_start_without_run_id_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUNS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let items = provider(&server, 20).search_products("kurta").await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_rejected_start_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RUNS))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = provider(&server, 20).search_products("kurta").await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::UpstreamStatus {
            provider: "ajio",
            status: 403
        }
    ));
}
