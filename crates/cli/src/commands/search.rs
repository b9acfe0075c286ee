use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use keendreams_core::DreamsConfig;
use keendreams_service::{Clock, PortfolioService, StatsService, SystemClock};

use crate::{open_repository, print_json};

pub(crate) async fn run_search(
    db_path: &Path,
    config: &DreamsConfig,
    query: &str,
    project: Option<&str>,
    limit: usize,
) -> Result<()> {
    let repo = open_repository(db_path, config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let results = PortfolioService::new(repo, clock).search(query, project, limit).await?;
    print_json(&results)
}

/// Computes stats directly from the store; the cache is not consulted.
pub(crate) async fn run_stats(db_path: &Path, config: &DreamsConfig) -> Result<()> {
    let repo = open_repository(db_path, config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stats = StatsService::new(repo, clock, config).compute_stats().await?;
    print_json(&stats)
}
