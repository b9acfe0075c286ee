use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use keendreams_core::DreamsConfig;
use keendreams_service::{Clock, MaintenanceService, SystemClock};

use crate::{open_repository, print_json};

fn maintenance_service(db_path: &Path, config: &DreamsConfig) -> Result<MaintenanceService> {
    let repo = open_repository(db_path, config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Ok(MaintenanceService::new(repo, clock, config.cleanup_min_quality))
}

pub(crate) async fn run_cleanup(db_path: &Path, config: &DreamsConfig) -> Result<()> {
    let report = maintenance_service(db_path, config)?.cleanup().await?;
    print_json(&report)
}

pub(crate) async fn run_dedup(db_path: &Path, config: &DreamsConfig) -> Result<()> {
    let report = maintenance_service(db_path, config)?.deduplicate().await?;
    print_json(&report)
}

pub(crate) async fn run_rebuild_projects(db_path: &Path, config: &DreamsConfig) -> Result<()> {
    let report = maintenance_service(db_path, config)?.rebuild_project_summaries().await?;
    print_json(&report)
}
