//! Data types for product search.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Price as reported by a provider.
///
/// Providers send either a number or a display string such as `"₹1,299.00"`.
/// After aggregation every price is an [`Price::Amount`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    /// Numeric price
    Amount(f64),
    /// Unparsed display string
    Text(String),
}

impl Price {
    /// Reads a price from a raw JSON value. Only numbers and strings qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Price::Amount),
            Value::String(text) => Some(Price::Text(text.clone())),
            _ => None,
        }
    }

    /// Coerces to a number.
    ///
    /// Strings keep only ASCII digits and dots before parsing; an empty or
    /// unparsable remainder yields `None`.
    pub fn to_amount(&self) -> Option<f64> {
        match self {
            Price::Amount(amount) => Some(*amount).filter(|a| a.is_finite()),
            Price::Text(text) => {
                let digits: String = text
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                digits.parse::<f64>().ok().filter(|a| a.is_finite())
            }
        }
    }
}

/// A product listing in the shape shared by every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// Listing title, empty when the provider gave none
    #[serde(default)]
    pub title: String,
    /// Price, numeric after aggregation
    pub price: Option<Price>,
    /// Product page URL
    pub link: Option<String>,
    /// Image URL
    pub thumbnail: Option<String>,
    /// Shop or provider name
    pub source: String,
    /// Original provider record, kept for debugging only
    #[serde(default)]
    pub raw: Value,
}

impl NormalizedItem {
    /// Numeric price, if the item has one.
    pub fn amount(&self) -> Option<f64> {
        self.price.as_ref().and_then(Price::to_amount)
    }

    /// Identity used to collapse duplicate listings.
    ///
    /// The link without its query string, falling back to the title. `None`
    /// when neither yields a non-empty key.
    pub fn dedupe_key(&self) -> Option<String> {
        let from_link = self
            .link
            .as_deref()
            .map(strip_query_string)
            .filter(|key| !key.is_empty());

        from_link
            .or_else(|| Some(self.title.as_str()).filter(|title| !title.is_empty()))
            .map(str::to_string)
    }
}

/// Everything before the first `?`.
pub fn strip_query_string(link: &str) -> &str {
    link.split_once('?').map_or(link, |(base, _)| base)
}

/// Response body of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// The query as received
    pub query: String,
    /// Deduplicated items, cheapest first
    pub results: Vec<NormalizedItem>,
}

impl AggregatedResult {
    /// A result with no items.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
        }
    }
}
