use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use keendreams_service::{CacheStatus, HealthReport, HealthStatus, SourceAnalysisReport};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::UpdateStatsRequest;
use crate::response_types::UpdateStatsResponse;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
const X_CACHE_AGE: HeaderName = HeaderName::from_static("x-cache-age");

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let cached = state.stats_service.stats().await?;
    let max_age = state.stats_service.cache_ttl().as_secs();

    let mut response = Json(cached.value).into_response();
    let headers = response.headers_mut();
    match cached.status {
        CacheStatus::Hit { age_secs } => {
            headers.insert(X_CACHE, HeaderValue::from_static("HIT"));
            headers.insert(X_CACHE_AGE, HeaderValue::from(age_secs));
        },
        CacheStatus::Miss => {
            headers.insert(X_CACHE, HeaderValue::from_static("MISS"));
        },
    }
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={max_age}")) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    Ok(response)
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let report = state.stats_service.health().await;
    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Warning => StatusCode::OK,
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

pub async fn analyze_dreams(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SourceAnalysisReport>, ApiError> {
    Ok(Json(state.stats_service.analyze_sources().await?))
}

/// Recomputes stats and waits for the cache write. The body is optional;
/// an unreadable body is treated as empty.
pub async fn update_stats(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UpdateStatsResponse>, ApiError> {
    let request: UpdateStatsRequest = serde_json::from_slice(&body).unwrap_or_default();
    let stats = state.stats_service.refresh_stats().await?;
    let source = request.source.unwrap_or_else(|| "unknown".to_owned());
    tracing::info!(source = %source, total = stats.dreams.total, "Stats refreshed on request");
    Ok(Json(UpdateStatsResponse {
        success: true,
        message: "Dashboard stats refreshed",
        stats,
        source,
        timestamp: state.clock.now().to_rfc3339(),
    }))
}
