//! Ajio listings scraped by an Apify actor run.
//!
//! A search starts an actor run, polls its status at a fixed interval for a
//! bounded number of attempts, and on success reads the run's dataset. Runs
//! that time out, fail, or never report an id produce no items rather than an
//! error.

use async_trait::async_trait;
use serde_json::{Value, json};
use shopscout_core::config::ApifyConfig;

use super::{ProductSearchProvider, fetch_json};
use crate::errors::SearchError;
use crate::extract::{FieldRule, price_field, text_field};
use crate::types::NormalizedItem;

const PROVIDER: &str = "ajio";

const TITLE: &[FieldRule] = &[FieldRule("/title"), FieldRule("/name")];
const PRICE: &[FieldRule] = &[FieldRule("/price"), FieldRule("/final_price")];
const LINK: &[FieldRule] = &[FieldRule("/url"), FieldRule("/product_link")];
const THUMBNAIL: &[FieldRule] = &[FieldRule("/image")];

const STATUS_SUCCEEDED: &str = "SUCCEEDED";
const TERMINAL_FAILURES: &[&str] = &["FAILED", "ABORTED", "TIMED-OUT"];

/// Lifecycle of one actor run as seen by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Run accepted, not yet polled.
    Started {
        /// Apify run id
        run_id: String,
    },
    /// Polled `attempt` times without reaching a terminal status.
    Polling {
        /// Apify run id
        run_id: String,
        /// Polls performed so far
        attempt: u32,
    },
    /// Run finished; its items live in `dataset_id`.
    Succeeded {
        /// Default dataset of the run
        dataset_id: String,
    },
    /// Poll budget exhausted before the run finished.
    TimedOut,
    /// Run ended without usable output.
    Aborted {
        /// Status or condition that ended the run
        reason: String,
    },
}

impl RunState {
    /// Applies one status poll result.
    ///
    /// Terminal states are returned unchanged.
    pub fn observe(self, status: Option<&str>, dataset_id: Option<String>, max_polls: u32) -> Self {
        let (run_id, attempt) = match self {
            RunState::Started { run_id } => (run_id, 1),
            RunState::Polling { run_id, attempt } => (run_id, attempt + 1),
            terminal => return terminal,
        };

        match status {
            Some(STATUS_SUCCEEDED) => match dataset_id {
                Some(dataset_id) => RunState::Succeeded { dataset_id },
                None => RunState::Aborted {
                    reason: "succeeded without a dataset".to_string(),
                },
            },
            Some(failed) if TERMINAL_FAILURES.contains(&failed) => RunState::Aborted {
                reason: failed.to_string(),
            },
            _ if attempt >= max_polls => RunState::TimedOut,
            _ => RunState::Polling { run_id, attempt },
        }
    }

    /// Whether no further polling will happen.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Started { .. } | RunState::Polling { .. })
    }
}

/// Apify actor run provider.
#[derive(Debug)]
pub struct ApifyProvider {
    client: reqwest::Client,
    config: ApifyConfig,
}

impl ApifyProvider {
    /// Creates the provider with a shared HTTP client.
    pub fn new(client: reqwest::Client, config: ApifyConfig) -> Self {
        Self { client, config }
    }

    /// Maps one dataset item.
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

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn start_run(&self, token: &str, query: &str) -> Result<Option<String>, SearchError> {
        let url = format!("{}/v2/acts/{}/runs", self.base_url(), self.config.actor_id);
        let request = self
            .client
            .post(&url)
            .query(&[("token", token)])
            .json(&json!({ "searchQuery": query }));

        let body = fetch_json(PROVIDER, request, self.config.start_timeout).await?;
        Ok(body
            .pointer("/data/id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string))
    }

    async fn poll_run(
        &self,
        token: &str,
        run_id: &str,
    ) -> Result<(Option<String>, Option<String>), SearchError> {
        let url = format!(
            "{}/v2/acts/{}/runs/{}",
            self.base_url(),
            self.config.actor_id,
            run_id
        );
        let request = self.client.get(&url).query(&[("token", token)]);

        let body = fetch_json(PROVIDER, request, self.config.poll_timeout).await?;
        let field = |pointer: &str| {
            body.pointer(pointer)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Ok((field("/data/status"), field("/data/defaultDatasetId")))
    }

    async fn fetch_dataset(
        &self,
        token: &str,
        dataset_id: &str,
    ) -> Result<Vec<NormalizedItem>, SearchError> {
        let url = format!("{}/v2/datasets/{}/items", self.base_url(), dataset_id);
        let request = self.client.get(&url).query(&[("token", token)]);

        match fetch_json(PROVIDER, request, self.config.poll_timeout).await? {
            Value::Array(items) => Ok(items.into_iter().map(Self::map_item).collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(SearchError::ParseError {
                provider: PROVIDER,
                reason: format!("dataset is not an array: {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl ProductSearchProvider for ApifyProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn search_products(&self, query: &str) -> Result<Vec<NormalizedItem>, SearchError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: PROVIDER,
                credential: "APIFY_TOKEN",
            })?;

        let Some(run_id) = self.start_run(token, query).await? else {
            tracing::warn!(source = PROVIDER, "Actor run started without a run id");
            return Ok(Vec::new());
        };
        tracing::debug!(source = PROVIDER, run_id = %run_id, "Actor run started");

        let mut state = RunState::Started { run_id };
        loop {
            let run_id = match &state {
                RunState::Started { run_id } | RunState::Polling { run_id, .. } => run_id.clone(),
                RunState::Succeeded { dataset_id } => {
                    return self.fetch_dataset(token, dataset_id).await;
                }
                RunState::TimedOut => {
                    tracing::warn!(
                        source = PROVIDER,
                        polls = self.config.max_polls,
                        "Actor run did not finish in time"
                    );
                    return Ok(Vec::new());
                }
                RunState::Aborted { reason } => {
                    tracing::warn!(source = PROVIDER, reason = %reason, "Actor run ended without results");
                    return Ok(Vec::new());
                }
            };

            tokio::time::sleep(self.config.poll_interval).await;
            let (status, dataset_id) = self.poll_run(token, &run_id).await?;
            state = state.observe(status.as_deref(), dataset_id, self.config.max_polls);
            tracing::debug!(source = PROVIDER, status = ?status, state = ?state, "Polled actor run");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Price;

    fn started() -> RunState {
        RunState::Started {
            run_id: "run-1".to_string(),
        }
    }

    #[test]
    fn test_running_status_keeps_polling() {
        let state = started().observe(Some("RUNNING"), None, 20);
        assert_eq!(
            state,
            RunState::Polling {
                run_id: "run-1".to_string(),
                attempt: 1
            }
        );
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_success_moves_to_dataset() {
        let state = started().observe(Some("SUCCEEDED"), Some("ds-9".to_string()), 20);
        assert_eq!(
            state,
            RunState::Succeeded {
                dataset_id: "ds-9".to_string()
            }
        );
    }

    #[test]
    fn test_success_without_dataset_aborts() {
        let state = started().observe(Some("SUCCEEDED"), None, 20);
        assert!(matches!(state, RunState::Aborted { .. }));
    }

    #[test]
    fn test_failed_run_aborts_immediately() {
        let state = started().observe(Some("FAILED"), None, 20);
        assert_eq!(
            state,
            RunState::Aborted {
                reason: "FAILED".to_string()
            }
        );
    }

    #[test]
    fn test_poll_budget_bounds_the_run() {
        let mut state = started();
        let mut polls = 0;
        while !state.is_terminal() {
            state = state.observe(Some("RUNNING"), None, 20);
            polls += 1;
        }

        assert_eq!(state, RunState::TimedOut);
        assert_eq!(polls, 20);
    }

    #[test]
    fn test_terminal_states_ignore_further_polls() {
        let state = RunState::TimedOut.observe(Some("SUCCEEDED"), Some("ds".to_string()), 20);
        assert_eq!(state, RunState::TimedOut);
    }

    #[test]
    fn test_map_item_fallbacks() {
        let item = ApifyProvider::map_item(json!({
            "name": "Cotton Shirt",
            "final_price": "Rs. 899",
            "product_link": "https://ajio.example/shirt",
            "image": "https://img.ajio.example/shirt.jpg"
        }));

        assert_eq!(item.source, "ajio");
        assert_eq!(item.title, "Cotton Shirt");
        assert_eq!(item.price, Some(Price::Text("Rs. 899".to_string())));
        assert_eq!(item.link.as_deref(), Some("https://ajio.example/shirt"));
        assert_eq!(
            item.thumbnail.as_deref(),
            Some("https://img.ajio.example/shirt.jpg")
        );
    }
}
