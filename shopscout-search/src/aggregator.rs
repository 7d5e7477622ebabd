//! Concurrent fan-out over every source and the merge pipeline.
//!
//! Sources are held in precedence order (affiliate, scraper, generic search).
//! That order decides which listing survives when two sources return the
//! same product.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use shopscout_core::config::SourcesConfig;

use crate::providers::{ApifyProvider, FlipkartProvider, ProductSearchProvider, SerpApiProvider};
use crate::types::{AggregatedResult, NormalizedItem, Price};

/// Whether a source will be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Provider name
    pub name: String,
    /// True when its credentials are configured
    pub enabled: bool,
}

/// Aggregates product listings from several providers.
#[derive(Debug, Clone)]
pub struct ProductAggregator {
    providers: Vec<Arc<dyn ProductSearchProvider>>,
}

impl ProductAggregator {
    /// Creates an aggregator over `providers`, given in precedence order.
    pub fn new(providers: Vec<Arc<dyn ProductSearchProvider>>) -> Self {
        Self { providers }
    }

    /// Builds the standard three sources from configuration.
    ///
    /// All providers share one HTTP connection pool.
    pub fn from_config(config: &SourcesConfig) -> Self {
        let client = reqwest::Client::new();
        let providers: Vec<Arc<dyn ProductSearchProvider>> = vec![
            Arc::new(FlipkartProvider::new(
                client.clone(),
                config.flipkart.clone(),
            )),
            Arc::new(ApifyProvider::new(client.clone(), config.apify.clone())),
            Arc::new(SerpApiProvider::new(client, config.serpapi.clone())),
        ];
        Self::new(providers)
    }

    /// Configuration state of every source, in precedence order.
    pub fn sources(&self) -> Vec<SourceStatus> {
        self.providers
            .iter()
            .map(|provider| SourceStatus {
                name: provider.name().to_string(),
                enabled: provider.is_configured(),
            })
            .collect()
    }

    /// Searches every configured source and merges the results.
    ///
    /// Never fails: an unconfigured source contributes nothing without a
    /// network call, and a failing source is logged and contributes nothing.
    /// Source calls run as detached tasks and finish on their own timeouts
    /// even if the caller stops waiting.
    pub async fn aggregate(&self, query: &str) -> AggregatedResult {
        let tasks = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let query = query.to_string();

            async move {
                let name = provider.name();
                if !provider.is_configured() {
                    tracing::debug!(source = name, "Source not configured, skipping");
                    return Vec::new();
                }

                let handle = tokio::spawn(async move { provider.search_products(&query).await });
                match handle.await {
                    Ok(Ok(items)) => {
                        tracing::debug!(source = name, count = items.len(), "Source returned items");
                        items
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(source = name, error = %e, "Source failed, using empty result");
                        Vec::new()
                    }
                    Err(e) => {
                        tracing::error!(source = name, error = %e, "Source task panicked");
                        Vec::new()
                    }
                }
            }
        });

        let batches = join_all(tasks).await;
        let fetched: usize = batches.iter().map(Vec::len).sum();
        let results = merge_results(batches);

        tracing::info!(
            query,
            fetched,
            returned = results.len(),
            "Aggregated search results"
        );

        AggregatedResult {
            query: query.to_string(),
            results,
        }
    }
}

/// Concatenates per-source batches (already in precedence order), drops
/// duplicates and keyless items, coerces prices, and sorts by price.
pub fn merge_results(batches: Vec<Vec<NormalizedItem>>) -> Vec<NormalizedItem> {
    let mut merged = deduplicate(batches.into_iter().flatten());
    for item in &mut merged {
        normalize_price(item);
    }
    sort_by_price(&mut merged);
    merged
}

/// Keeps the first item seen for each dedupe key; items without a key are
/// dropped.
pub fn deduplicate(items: impl IntoIterator<Item = NormalizedItem>) -> Vec<NormalizedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| item.dedupe_key().is_some_and(|key| seen.insert(key)))
        .collect()
}

/// Replaces the item's price with its numeric value, or clears it.
pub fn normalize_price(item: &mut NormalizedItem) {
    item.price = item.amount().map(Price::Amount);
}

/// Stable ascending sort by price; items without a price go last.
pub fn sort_by_price(items: &mut [NormalizedItem]) {
    items.sort_by(|a, b| {
        let pa = a.amount().unwrap_or(f64::INFINITY);
        let pb = b.amount().unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });
}
