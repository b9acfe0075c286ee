use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use keendreams_service::{
    LocationsReport, PortfolioOverview, Preferences, ProjectDetails, SearchResults,
};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::SearchQuery;

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Query parameter 'q' is required".to_owned()));
    };
    let results =
        state.portfolio_service.search(q, query.project.as_deref(), query.capped_limit()).await?;
    Ok(Json(results))
}

pub async fn portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioOverview>, ApiError> {
    Ok(Json(state.portfolio_service.portfolio().await?))
}

pub async fn project(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ProjectDetails>, ApiError> {
    state
        .portfolio_service
        .project_details(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project not found".to_owned()))
}

pub async fn preferences(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Preferences>, ApiError> {
    Ok(Json(state.portfolio_service.preferences().await?))
}

pub async fn locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LocationsReport>, ApiError> {
    Ok(Json(state.portfolio_service.locations().await?))
}
