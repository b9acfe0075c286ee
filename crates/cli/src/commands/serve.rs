use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use keendreams_core::{DreamsConfig, env_non_empty};
use keendreams_http::{AppState, create_router, start_stats_warmer};
use keendreams_service::{Clock, SystemClock};
use keendreams_storage::{DreamRepository, StorageBackend};

use crate::open_repository;

pub(crate) async fn run(
    port: u16,
    host: String,
    in_memory: bool,
    db_path: &Path,
    config: &DreamsConfig,
) -> Result<()> {
    let api_secret = env_non_empty("KEENDREAMS_API_SECRET")
        .context("KEENDREAMS_API_SECRET environment variable must be set")?;
    let allowed_origin = env_non_empty("KEENDREAMS_ALLOWED_ORIGIN");

    let repo = if in_memory {
        tracing::warn!("Using in-memory storage, dreams are lost on exit");
        Arc::new(DreamRepository::new(StorageBackend::new_memory(), config.list_page_size))
    } else {
        open_repository(db_path, config)?
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AppState::new(repo, clock, config, api_secret, allowed_origin));

    start_stats_warmer(
        Arc::clone(&state.stats_service),
        Duration::from_secs(config.stats_warm_interval_secs),
    );

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
