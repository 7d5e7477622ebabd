//! HTTP request handlers organized by functionality

pub mod api;
pub mod auth;

pub use api::{SearchParams, api_search, api_sources};
pub use auth::{api_login, api_me, api_register};
