//! Shopscout Core - Configuration, logging, user storage and authentication
//!
//! This crate provides the building blocks shared by the search, web and CLI
//! crates: the process-wide configuration struct, tracing setup, the flat-file
//! user store, and token-based authentication.

pub mod auth;
pub mod config;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use auth::{AuthError, AuthService, AuthSession, Claims, PublicUser};
pub use config::{ConfigError, ShopscoutConfig};
pub use storage::{StoreError, User, UserStore};

/// Errors that can bubble up from any Shopscout subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ShopscoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {reason}")]
    Server { reason: String },
}

/// Convenience type alias for Results with ShopscoutError.
pub type Result<T> = std::result::Result<T, ShopscoutError>;
