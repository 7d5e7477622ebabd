//! Integration tests for Shopscout
//!
//! Each source adapter is driven against a local mock HTTP server to check
//! the request it sends, how it maps the payload, and how upstream failures
//! surface.

#[path = "integration/aggregator.rs"]
mod aggregator;
#[path = "integration/apify.rs"]
mod apify;
#[path = "integration/flipkart.rs"]
mod flipkart;
#[path = "integration/serpapi.rs"]
mod serpapi;
