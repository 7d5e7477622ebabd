//! Affiliate product search through the Flipkart affiliate API.
//!
//! The response shape differs between API versions, so both the container key
//! and every field are resolved through ordered [`FieldRule`] lists.

use async_trait::async_trait;
use serde_json::Value;
use shopscout_core::config::FlipkartConfig;

use super::{ProductSearchProvider, fetch_json};
use crate::errors::SearchError;
use crate::extract::{FieldRule, price_field, record_list, text_field};
use crate::types::NormalizedItem;

const PROVIDER: &str = "flipkart";

const CONTAINERS: &[&str] = &["products", "productInfoList", "product"];

const TITLE: &[FieldRule] = &[
    FieldRule("/productBaseInfoV1/title"),
    FieldRule("/title"),
    FieldRule("/product/title"),
];
const PRICE: &[FieldRule] = &[
    FieldRule("/productBaseInfoV1/flipkartSellingPrice/amount"),
    FieldRule("/productBaseInfoV1/maximumRetailPrice/amount"),
    FieldRule("/price"),
];
const LINK: &[FieldRule] = &[
    FieldRule("/productBaseInfoV1/productUrl"),
    FieldRule("/productUrl"),
    FieldRule("/url"),
];
const THUMBNAIL: &[FieldRule] = &[
    FieldRule("/productBaseInfoV1/imageUrls/0"),
    FieldRule("/imageUrl"),
];

/// Flipkart affiliate search provider.
#[derive(Debug)]
pub struct FlipkartProvider {
    client: reqwest::Client,
    config: FlipkartConfig,
}

impl FlipkartProvider {
    /// Creates the provider with a shared HTTP client.
    pub fn new(client: reqwest::Client, config: FlipkartConfig) -> Self {
        Self { client, config }
    }

    /// Maps one product record.
    pub fn map_item(raw: Value) -> NormalizedItem {
        NormalizedItem {
            source: PROVIDER.to_string(),
            title: text_field(&raw, TITLE).unwrap_or_default(),
            price: price_field(&raw, PRICE),
            link: text_field(&raw, LINK),
            thumbnail: text_field(&raw, THUMBNAIL),
            raw,
        }
    }

    /// Maps every record in a search response body.
    pub fn map_response(body: &Value) -> Vec<NormalizedItem> {
        record_list(body, CONTAINERS)
            .iter()
            .cloned()
            .map(Self::map_item)
            .collect()
    }
}

#[async_trait]
impl ProductSearchProvider for FlipkartProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn search_products(&self, query: &str) -> Result<Vec<NormalizedItem>, SearchError> {
        let (Some(affiliate_id), Some(affiliate_token)) = (
            self.config.affiliate_id.as_deref(),
            self.config.affiliate_token.as_deref(),
        ) else {
            return Err(SearchError::MissingCredential {
                provider: PROVIDER,
                credential: "FLIPKART_AFFILIATE_ID/FLIPKART_AFFILIATE_TOKEN",
            });
        };

        let url = format!(
            "{}/affiliate/search/json",
            self.config.base_url.trim_end_matches('/')
        );
        let result_count = self.config.result_count.to_string();
        let request = self
            .client
            .get(&url)
            .query(&[("query", query), ("resultCount", result_count.as_str())])
            .header("Fk-Affiliate-Id", affiliate_id)
            .header("Fk-Affiliate-Token", affiliate_token);

        let body = fetch_json(PROVIDER, request, self.config.timeout).await?;
        Ok(Self::map_response(&body))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Price;

    #[test]
    fn test_map_item_reads_v1_base_info() {
        let item = FlipkartProvider::map_item(json!({
            "productBaseInfoV1": {
                "title": "Redmi Note 13",
                "flipkartSellingPrice": {"amount": 17999, "currency": "INR"},
                "maximumRetailPrice": {"amount": 20999, "currency": "INR"},
                "productUrl": "https://dl.flipkart.example/redmi?affid=x",
                "imageUrls": ["https://img.flipkart.example/redmi.jpg"]
            }
        }));

        assert_eq!(item.source, "flipkart");
        assert_eq!(item.title, "Redmi Note 13");
        assert_eq!(item.price, Some(Price::Amount(17999.0)));
        assert_eq!(
            item.link.as_deref(),
            Some("https://dl.flipkart.example/redmi?affid=x")
        );
        assert_eq!(
            item.thumbnail.as_deref(),
            Some("https://img.flipkart.example/redmi.jpg")
        );
    }

    #[test]
    fn test_map_item_falls_back_to_mrp_then_flat_fields() {
        let item = FlipkartProvider::map_item(json!({
            "productBaseInfoV1": {"maximumRetailPrice": {"amount": 999}},
            "product": {"title": "Nested title"},
            "url": "https://flipkart.example/p",
            "imageUrl": "https://img.example/x.jpg"
        }));

        assert_eq!(item.title, "Nested title");
        assert_eq!(item.price, Some(Price::Amount(999.0)));
        assert_eq!(item.link.as_deref(), Some("https://flipkart.example/p"));
        assert_eq!(item.thumbnail.as_deref(), Some("https://img.example/x.jpg"));
    }

    #[test]
    fn test_map_response_tries_container_keys_in_order() {
        let body = json!({"productInfoList": [{"title": "A"}, {"title": "B"}]});
        let titles: Vec<String> = FlipkartProvider::map_response(&body)
            .into_iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);

        assert!(FlipkartProvider::map_response(&json!({"unexpected": []})).is_empty());
    }

    #[tokio::test]
    async fn test_requires_both_credentials() {
        let config = FlipkartConfig {
            affiliate_id: Some("aff".to_string()),
            ..FlipkartConfig::default()
        };
        let provider = FlipkartProvider::new(reqwest::Client::new(), config);

        assert!(!provider.is_configured());
        assert!(matches!(
            provider.search_products("shoes").await,
            Err(SearchError::MissingCredential { .. })
        ));
    }
}
