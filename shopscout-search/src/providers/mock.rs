//! Mock provider implementation for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::ProductSearchProvider;
use crate::errors::SearchError;
use crate::types::{NormalizedItem, Price};

/// Provider returning canned items, or failing, without network access.
#[derive(Debug)]
pub struct MockProvider {
    name: &'static str,
    configured: bool,
    fail: bool,
    items: Vec<NormalizedItem>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Configured provider returning `items`.
    pub fn with_items(name: &'static str, items: Vec<NormalizedItem>) -> Self {
        Self {
            name,
            configured: true,
            fail: false,
            items,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configured provider whose every search fails with a network error.
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::with_items(name, Vec::new())
        }
    }

    /// Provider without credentials.
    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::with_items(name, Vec::new())
        }
    }

    /// Number of times `search_products` ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Builds an item attributed to `source`.
    pub fn item(source: &str, title: &str, link: Option<&str>, price: Option<Price>) -> NormalizedItem {
        NormalizedItem {
            title: title.to_string(),
            price,
            link: link.map(str::to_string),
            thumbnail: None,
            source: source.to_string(),
            raw: serde_json::json!({ "title": title }),
        }
    }
}

#[async_trait]
impl ProductSearchProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search_products(&self, _query: &str) -> Result<Vec<NormalizedItem>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.configured {
            return Err(SearchError::MissingCredential {
                provider: self.name,
                credential: "MOCK_TOKEN",
            });
        }
        if self.fail {
            return Err(SearchError::NetworkError {
                provider: self.name,
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.items.clone())
    }
}
