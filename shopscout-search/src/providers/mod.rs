//! Source adapters for product search.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::NormalizedItem;

pub mod apify;
pub mod flipkart;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod serpapi;

pub use apify::{ApifyProvider, RunState};
pub use flipkart::FlipkartProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockProvider;
pub use serpapi::SerpApiProvider;

/// Trait for product search sources.
///
/// Implementations translate one provider's request and response format into
/// [`NormalizedItem`]s.
#[async_trait]
pub trait ProductSearchProvider: Send + Sync + std::fmt::Debug {
    /// Short stable name used in logs and status reports.
    fn name(&self) -> &'static str;

    /// Whether the credentials needed to call the provider are present.
    fn is_configured(&self) -> bool;

    /// Search the provider for `query`.
    ///
    /// # Errors
    /// - `SearchError::MissingCredential` - Provider is not configured
    /// - `SearchError::NetworkError` - Transport failure or timeout
    /// - `SearchError::UpstreamStatus` - Non-success HTTP status
    /// - `SearchError::ParseError` - Response body is not the expected JSON
    async fn search_products(&self, query: &str) -> Result<Vec<NormalizedItem>, SearchError>;
}

/// Sends `request` with a per-call timeout and decodes a JSON body.
pub(crate) async fn fetch_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, SearchError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| SearchError::NetworkError {
            provider,
            reason: format!("request failed: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::UpstreamStatus {
            provider,
            status: status.as_u16(),
        });
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_timeout() {
            SearchError::NetworkError {
                provider,
                reason: format!("body read timed out: {e}"),
            }
        } else {
            SearchError::ParseError {
                provider,
                reason: format!("JSON parsing failed: {e}"),
            }
        }
    })
}
