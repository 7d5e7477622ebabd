//! Account handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use shopscout_core::auth::{LoginRequest, RegisterRequest};
use shopscout_core::{AuthSession, Claims};

use crate::error::ApiError;
use crate::server::AppState;

/// Creates an account and returns a session.
///
/// # Errors
/// - `ApiError::BadRequest` - Malformed body, missing fields, or email in use
/// - `ApiError::Internal` - Hashing or persisting the user failed
pub async fn api_register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.auth.register(request).await?))
}

/// Exchanges credentials for a session.
///
/// # Errors
/// - `ApiError::BadRequest` - Malformed body
/// - `ApiError::Unauthorized` - Unknown email or wrong password
pub async fn api_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.auth.login(request).await?))
}

/// Returns the claims of the caller's token.
pub async fn api_me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}
