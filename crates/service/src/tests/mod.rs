//! Test utilities and module declarations for service tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keendreams_core::DreamsConfig;
use keendreams_storage::{DreamRepository, StorageBackend};
use serde_json::{Value, json};

use crate::{Clock, DreamService, MaintenanceService, ManualClock, PortfolioService, StatsService};

pub const TEST_NOW: &str = "2025-09-14T13:00:00Z";

pub struct TestServices {
    pub repo: Arc<DreamRepository>,
    pub clock: Arc<ManualClock>,
    pub stats: Arc<StatsService>,
    pub dreams: DreamService,
    pub maintenance: MaintenanceService,
    pub portfolio: PortfolioService,
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_NOW).unwrap().with_timezone(&Utc)
}

pub fn create_test_services(config: &DreamsConfig) -> TestServices {
    let repo = Arc::new(DreamRepository::new(StorageBackend::new_memory(), 3));
    let clock = Arc::new(ManualClock::new(test_now()));
    let dyn_clock: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
    let stats = Arc::new(StatsService::new(Arc::clone(&repo), Arc::clone(&dyn_clock), config));
    TestServices {
        dreams: DreamService::new(Arc::clone(&repo), Arc::clone(&stats), Arc::clone(&dyn_clock)),
        maintenance: MaintenanceService::new(
            Arc::clone(&repo),
            Arc::clone(&dyn_clock),
            config.cleanup_min_quality,
        ),
        portfolio: PortfolioService::new(Arc::clone(&repo), dyn_clock),
        repo,
        clock,
        stats,
    }
}

pub fn default_services() -> TestServices {
    create_test_services(&DreamsConfig::default())
}

/// A payload scoring 60: detailed summary, tech stack, decisions, duration
/// and commit hash. Without a commit hash it scores 50.
pub fn dream_payload(project_path: &str, id: &str, commit_hash: Option<&str>) -> Value {
    let project_name = project_path.rsplit('/').next().unwrap_or(project_path);
    json!({
        "id": id,
        "projectPath": project_path,
        "projectName": project_name,
        "timestamp": "2025-09-14T12:57:22Z",
        "context": {
            "summary": "Implemented the deploy pipeline and wired the release checks.",
            "techStack": ["rust", "axum"],
        },
        "conversation": {
            "keyDecisions": ["Use a single KV namespace per entity"],
        },
        "metadata": {
            "duration": 7200,
            "commitHash": commit_hash,
        },
    })
}

mod dream_service_tests;
mod maintenance_tests;
