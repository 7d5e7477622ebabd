//! Shared fixtures for tests across the workspace.

use std::sync::Arc;

use tempfile::TempDir;

use crate::auth::AuthService;
use crate::config::{AuthConfig, ShopscoutConfig};
use crate::storage::UserStore;

/// Secret used by every fixture-built auth service.
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Configuration with no sources enabled, a test secret, and the cheapest
/// bcrypt cost. The users file lives inside `dir`.
pub fn test_config(dir: &TempDir) -> ShopscoutConfig {
    let mut config = ShopscoutConfig::default();
    config.server.users_file = dir.path().join("users.json");
    config.server.static_dir = dir.path().join("public");
    config.auth = AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bcrypt_cost: 4,
        ..AuthConfig::default()
    };
    config
}

/// Auth service backed by a fresh users file inside `dir`.
pub fn test_auth_service(dir: &TempDir) -> AuthService {
    let config = test_config(dir);
    AuthService::new(
        &config.auth,
        Arc::new(UserStore::new(config.server.users_file)),
    )
}
