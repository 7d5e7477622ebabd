//! Bearer token guard.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::server::AppState;

const MISSING_TOKEN: &str = "missing auth token";
const INVALID_HEADER: &str = "invalid auth header";
const INVALID_TOKEN: &str = "invalid token";

/// Rejects requests without a valid `Authorization: Bearer <token>` header
/// and attaches the decoded [`shopscout_core::Claims`] to the request
/// extensions otherwise.
///
/// # Errors
/// - `ApiError::Unauthorized` - Header absent, malformed, or token rejected
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extracts the token from a `Bearer` authorization header.
///
/// # Errors
/// - `ApiError::Unauthorized` - Header absent or not `Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized(INVALID_HEADER))?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::unauthorized(INVALID_HEADER)),
    }
}
