use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use keendreams_core::{DreamRecord, ProjectSummary};
use keendreams_service::{DreamListing, IngestOutcome, LatestDream};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::DreamsQuery;
use crate::response_types::{CaptureResponse, DuplicateResponse};

fn latest_not_found(missing: &LatestDream) -> ApiError {
    match missing {
        LatestDream::DreamMissing => ApiError::NotFound("Dream data not found".to_owned()),
        _ => ApiError::NotFound("Project not found".to_owned()),
    }
}

pub async fn capture_dream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidDream(vec![e.body_text()]))?;
    let response = match state.dream_service.ingest(payload).await? {
        IngestOutcome::Stored { dream_id, quality_score, storage_used } => Json(CaptureResponse {
            success: true,
            dream_id,
            message: "Dream captured successfully",
            quality_score,
            storage_used,
        })
        .into_response(),
        IngestOutcome::Duplicate { existing_dream_id } => Json(DuplicateResponse {
            success: false,
            message: "Dream already exists for this commit",
            existing_dream_id,
        })
        .into_response(),
    };
    Ok(response)
}

pub async fn get_dream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DreamRecord>, ApiError> {
    state
        .dream_service
        .get_dream(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Dream not found".to_owned()))
}

pub async fn latest_dream(
    State(state): State<Arc<AppState>>,
    Path(project_path): Path<String>,
) -> Result<Json<DreamRecord>, ApiError> {
    match state.dream_service.latest_dream(&project_path).await? {
        LatestDream::Found(dream) => Ok(Json(*dream)),
        missing => Err(latest_not_found(&missing)),
    }
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Path(project_path): Path<String>,
) -> Result<Response, ApiError> {
    let markdown = state
        .dream_service
        .summary_markdown(&project_path)
        .await?
        .map_err(|missing| latest_not_found(&missing))?;
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], markdown).into_response())
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    Ok(Json(state.dream_service.list_projects().await?))
}

pub async fn list_dreams(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DreamsQuery>,
) -> Result<Json<DreamListing>, ApiError> {
    let listing =
        state.dream_service.list_dreams(query.capped_limit(), query.cursor.as_deref()).await?;
    Ok(Json(listing))
}
