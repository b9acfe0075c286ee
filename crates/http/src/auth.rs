//! Shared-secret authentication for the write and admin routes.
//!
//! The secret is read from `Authorization: Bearer <token>` first, then from
//! the `key` query parameter. No credential yields 401, a wrong one 403.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::api_error::ApiError;

fn bearer_token(request: &Request) -> Option<String> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn query_key(request: &Request) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri()).ok()?;
    params.get("key").filter(|k| !k.is_empty()).cloned()
}

/// Rejects requests that do not carry the configured secret.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(supplied) = bearer_token(&request).or_else(|| query_key(&request)) else {
        tracing::debug!(path = %request.uri().path(), "Request without credentials");
        return Err(ApiError::Unauthorized);
    };
    if supplied != state.api_secret {
        tracing::warn!(path = %request.uri().path(), "Request with wrong credentials");
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
