//! Shopscout Search - Product search aggregation

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Queries several shopping data sources concurrently, normalizes each
//! provider's payload into [`NormalizedItem`], then merges, deduplicates and
//! sorts the combined list by price.

pub mod aggregator;
pub mod errors;
pub mod extract;
pub mod providers;
pub mod types;

// Re-export main types
pub use aggregator::{ProductAggregator, SourceStatus};
pub use errors::SearchError;
pub use providers::ProductSearchProvider;
pub use types::{AggregatedResult, NormalizedItem, Price};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
