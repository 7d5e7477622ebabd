//! Generic shopping search through SerpApi's Google Shopping engine.

use async_trait::async_trait;
use serde_json::Value;
use shopscout_core::config::SerpApiConfig;

use super::{ProductSearchProvider, fetch_json};
use crate::errors::SearchError;
use crate::extract::{FieldRule, price_field, record_list, text_field};
use crate::types::NormalizedItem;

const PROVIDER: &str = "serpapi";

const SOURCE: &[FieldRule] = &[FieldRule("/source"), FieldRule("/shop")];
const TITLE: &[FieldRule] = &[FieldRule("/title")];
const PRICE: &[FieldRule] = &[FieldRule("/price"), FieldRule("/extracted_price")];
const LINK: &[FieldRule] = &[FieldRule("/link"), FieldRule("/product_link")];
const THUMBNAIL: &[FieldRule] = &[FieldRule("/thumbnail"), FieldRule("/thumbnails/0")];

/// SerpApi Google Shopping provider.
#[derive(Debug)]
pub struct SerpApiProvider {
    client: reqwest::Client,
    config: SerpApiConfig,
}

impl SerpApiProvider {
    /// Creates the provider with a shared HTTP client.
    pub fn new(client: reqwest::Client, config: SerpApiConfig) -> Self {
        Self { client, config }
    }

    /// Maps one `shopping_results` entry.
    pub fn map_item(raw: Value) -> NormalizedItem {
        NormalizedItem {
            source: text_field(&raw, SOURCE).unwrap_or_else(|| "unknown".to_string()),
            title: text_field(&raw, TITLE).unwrap_or_default(),
            price: price_field(&raw, PRICE),
            link: text_field(&raw, LINK),
            thumbnail: text_field(&raw, THUMBNAIL),
            raw,
        }
    }
}

#[async_trait]
impl ProductSearchProvider for SerpApiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn search_products(&self, query: &str) -> Result<Vec<NormalizedItem>, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: PROVIDER,
                credential: "SERPAPI_KEY",
            })?;

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let num = self.config.result_count.to_string();
        let request = self.client.get(&url).query(&[
            ("engine", "google_shopping"),
            ("q", query),
            ("api_key", api_key),
            ("num", num.as_str()),
        ]);

        let body = fetch_json(PROVIDER, request, self.config.timeout).await?;

        Ok(record_list(&body, &["shopping_results"])
            .iter()
            .cloned()
            .map(Self::map_item)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Price;

    #[test]
    fn test_map_item_prefers_primary_fields() {
        let item = SerpApiProvider::map_item(json!({
            "source": "Croma",
            "shop": "ignored",
            "title": "Pixel 9",
            "price": "₹79,999.00",
            "extracted_price": 79999,
            "link": "https://croma.example/pixel-9",
            "thumbnail": "https://img.example/p9.jpg"
        }));

        assert_eq!(item.source, "Croma");
        assert_eq!(item.title, "Pixel 9");
        assert_eq!(item.price, Some(Price::Text("₹79,999.00".to_string())));
        assert_eq!(item.link.as_deref(), Some("https://croma.example/pixel-9"));
        assert_eq!(item.thumbnail.as_deref(), Some("https://img.example/p9.jpg"));
        assert_eq!(item.raw["extracted_price"], 79999);
    }

    #[test]
    fn test_map_item_uses_fallback_fields() {
        let item = SerpApiProvider::map_item(json!({
            "shop": "Reliance",
            "extracted_price": 1499.5,
            "product_link": "https://google.example/shopping/product/1",
            "thumbnails": ["https://img.example/first.jpg"]
        }));

        assert_eq!(item.source, "Reliance");
        assert_eq!(item.title, "");
        assert_eq!(item.price, Some(Price::Amount(1499.5)));
        assert_eq!(
            item.link.as_deref(),
            Some("https://google.example/shopping/product/1")
        );
        assert_eq!(item.thumbnail.as_deref(), Some("https://img.example/first.jpg"));
    }

    #[test]
    fn test_map_item_defaults_source_to_unknown() {
        let item = SerpApiProvider::map_item(json!({"title": "Mystery"}));
        assert_eq!(item.source, "unknown");
        assert_eq!(item.price, None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let provider = SerpApiProvider::new(reqwest::Client::new(), SerpApiConfig::default());

        assert!(!provider.is_configured());
        let err = provider.search_products("phone").await.unwrap_err();
        assert!(matches!(err, SearchError::MissingCredential { .. }));
    }
}
