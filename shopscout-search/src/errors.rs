//! Error types for product search.

use thiserror::Error;

/// Errors raised by a single source adapter.
///
/// The aggregator converts every one of these into an empty contribution;
/// none of them reach the HTTP client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The adapter's credential is not configured.
    #[error("{provider} is not configured: {credential} missing")]
    MissingCredential {
        /// Adapter that was called
        provider: &'static str,
        /// Name of the absent credential
        credential: &'static str,
    },

    /// Transport failure or timeout talking to the upstream API.
    #[error("{provider} network error: {reason}")]
    NetworkError {
        /// Adapter that was called
        provider: &'static str,
        /// The reason for the network error
        reason: String,
    },

    /// Upstream answered with a non-success status code.
    #[error("{provider} returned HTTP {status}")]
    UpstreamStatus {
        /// Adapter that was called
        provider: &'static str,
        /// HTTP status code received
        status: u16,
    },

    /// Upstream payload could not be decoded.
    #[error("{provider} parse error: {reason}")]
    ParseError {
        /// Adapter that was called
        provider: &'static str,
        /// The reason for the parse error
        reason: String,
    },
}

impl SearchError {
    /// Name of the adapter that produced the error.
    pub fn provider(&self) -> &'static str {
        match self {
            SearchError::MissingCredential { provider, .. }
            | SearchError::NetworkError { provider, .. }
            | SearchError::UpstreamStatus { provider, .. }
            | SearchError::ParseError { provider, .. } => provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message() {
        let err = SearchError::MissingCredential {
            provider: "serpapi",
            credential: "SERPAPI_KEY",
        };
        assert_eq!(err.to_string(), "serpapi is not configured: SERPAPI_KEY missing");
        assert_eq!(err.provider(), "serpapi");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
