//! Persistent state: the flat-file user store.

pub mod user_store;

pub use user_store::{NewUser, User, UserStore};

/// Errors raised by the user store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User with email {email} already exists")]
    Duplicate { email: String },

    #[error("User store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No user id left after {last}")]
    IdsExhausted { last: u64 },
}
