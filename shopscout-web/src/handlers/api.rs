//! Product search and source status handlers

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use shopscout_search::AggregatedResult;

use crate::error::ApiError;
use crate::server::AppState;

/// Query string of `GET /api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search text
    pub q: Option<String>,
}

/// Searches every configured source.
///
/// # Errors
/// - `ApiError::BadRequest` - `q` missing or empty
pub async fn api_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<AggregatedResult>, ApiError> {
    let Query(params) = params?;
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query param q required".to_string()))?;

    Ok(Json(state.aggregator.aggregate(&query).await))
}

/// Lists sources in precedence order with their configuration state.
pub async fn api_sources(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sources": state.aggregator.sources() }))
}
