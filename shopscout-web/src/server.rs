//! Router assembly and the HTTP server loop.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use shopscout_core::{AuthService, ShopscoutConfig, ShopscoutError, UserStore};
use shopscout_search::ProductAggregator;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::handlers::{api_login, api_me, api_register, api_search, api_sources};
use crate::middleware::require_auth;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fan-out over the product sources
    pub aggregator: Arc<ProductAggregator>,
    /// Registration, login and token checks
    pub auth: Arc<AuthService>,
    /// Directory holding the front end; `index.html` is the fallback page
    pub static_dir: PathBuf,
    /// Put `/api/search` behind the bearer middleware
    pub search_requires_auth: bool,
}

impl AppState {
    /// Wires the aggregator and auth service from configuration.
    pub fn from_config(config: &ShopscoutConfig) -> Self {
        let store = Arc::new(UserStore::new(config.server.users_file.clone()));
        Self {
            aggregator: Arc::new(ProductAggregator::from_config(&config.sources)),
            auth: Arc::new(AuthService::new(&config.auth, store)),
            static_dir: config.server.static_dir.clone(),
            search_requires_auth: config.auth.search_requires_auth,
        }
    }
}

/// Builds the application router.
///
/// API routes are matched first; every other path is served from the static
/// directory, falling back to its `index.html` for client-side routing.
pub fn build_router(state: AppState) -> Router {
    let auth_guard = from_fn_with_state(state.clone(), require_auth);

    let search = if state.search_requires_auth {
        get(api_search).route_layer(auth_guard.clone())
    } else {
        get(api_search)
    };

    let static_files = ServeDir::new(&state.static_dir)
        .fallback(ServeFile::new(state.static_dir.join("index.html")));

    Router::new()
        .route("/api/search", search)
        .route("/api/sources", get(api_sources))
        .route("/api/register", post(api_register))
        .route("/api/login", post(api_login))
        .route("/api/me", get(api_me).route_layer(auth_guard))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API until Ctrl-C.
///
/// # Errors
/// - `ShopscoutError::Config` - Configuration failed validation
/// - `ShopscoutError::Io` - The listener could not bind
/// - `ShopscoutError::Server` - The server loop failed
pub async fn run_server(config: ShopscoutConfig) -> Result<(), ShopscoutError> {
    config.validate()?;

    if config.auth.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set, signing tokens with the development secret");
    }
    let enabled = config.enabled_sources();
    if enabled.is_empty() {
        tracing::warn!("No product sources configured, searches will return no results");
    }

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        sources = ?enabled,
        static_dir = %config.server.static_dir.display(),
        "Server running on http://{address}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ShopscoutError::Server {
            reason: e.to_string(),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
