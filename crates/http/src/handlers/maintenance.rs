use std::sync::Arc;

use axum::{Json, extract::State};
use keendreams_service::{CleanupReport, DedupReport, RebuildReport};

use crate::AppState;
use crate::api_error::ApiError;

pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<CleanupReport>, ApiError> {
    Ok(Json(state.maintenance_service.cleanup().await?))
}

pub async fn deduplicate(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DedupReport>, ApiError> {
    Ok(Json(state.maintenance_service.deduplicate().await?))
}

pub async fn rebuild_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RebuildReport>, ApiError> {
    Ok(Json(state.maintenance_service.rebuild_project_summaries().await?))
}
