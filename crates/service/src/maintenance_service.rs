//! Full-namespace maintenance passes: low-quality cleanup, commit-hash
//! dedup and project summary rebuild.
//!
//! Each pass is a single scan over the dreams namespace. Deletes of keys
//! that vanished mid-pass are not counted, so repeating a pass is a no-op.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures_util::StreamExt as _;
use keendreams_core::{DreamRecord, ProjectSummary, quality_score};
use keendreams_storage::DreamRepository;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub success: bool,
    pub cleaned: usize,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub success: bool,
    pub removed: usize,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub success: bool,
    pub rebuilt: usize,
    /// Summaries deleted because no dream of their project remains.
    pub removed: usize,
    pub message: String,
    pub timestamp: String,
}

struct ProjectAccumulator {
    latest: DreamRecord,
    dream_count: usize,
    total_hours: f64,
}

#[derive(Debug)]
pub struct MaintenanceService {
    repo: Arc<DreamRepository>,
    clock: Arc<dyn Clock>,
    min_quality: u8,
}

impl MaintenanceService {
    #[must_use]
    pub const fn new(repo: Arc<DreamRepository>, clock: Arc<dyn Clock>, min_quality: u8) -> Self {
        Self { repo, clock, min_quality }
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339()
    }

    /// Deletes every dream scoring below the cleanup threshold. Dreams with
    /// no stored score are scored on the fly.
    pub async fn cleanup(&self) -> Result<CleanupReport, ServiceError> {
        let mut doomed = Vec::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let stored = item?;
            let score =
                stored.dream.metadata.quality_score.unwrap_or_else(|| quality_score(&stored.dream));
            if score < self.min_quality {
                doomed.push(stored.key);
            }
        }
        drop(stream);

        let mut cleaned = 0_usize;
        for key in doomed {
            if self.repo.delete_dream_key(&key).await? {
                cleaned = cleaned.saturating_add(1);
            }
        }

        tracing::info!(cleaned, min_quality = self.min_quality, "Cleanup pass finished");
        Ok(CleanupReport {
            success: true,
            cleaned,
            message: format!("Cleaned {cleaned} low-quality dreams"),
            timestamp: self.timestamp(),
        })
    }

    /// Keeps the first dream (in key order) per `projectPath:commitHash` and
    /// deletes the rest. Dreams without a commit hash are never touched.
    pub async fn deduplicate(&self) -> Result<DedupReport, ServiceError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut doomed = Vec::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let stored = item?;
            let Some(commit_hash) = stored.dream.commit_hash() else {
                continue;
            };
            let signature = format!("{}:{commit_hash}", stored.dream.project_path);
            if !seen.insert(signature) {
                doomed.push(stored.key);
            }
        }
        drop(stream);

        let mut removed = 0_usize;
        for key in doomed {
            if self.repo.delete_dream_key(&key).await? {
                removed = removed.saturating_add(1);
            }
        }

        tracing::info!(removed, "Dedup pass finished");
        Ok(DedupReport {
            success: true,
            removed,
            message: format!("Removed {removed} duplicate dreams"),
            timestamp: self.timestamp(),
        })
    }

    /// Rewrites every project summary from a dream rescan and drops
    /// summaries whose project has no dreams left.
    pub async fn rebuild_project_summaries(&self) -> Result<RebuildReport, ServiceError> {
        let mut projects: BTreeMap<String, ProjectAccumulator> = BTreeMap::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let dream = item?.dream;
            let hours = dream.duration_hours();
            match projects.get_mut(&dream.project_path) {
                Some(acc) => {
                    acc.dream_count = acc.dream_count.saturating_add(1);
                    acc.total_hours += hours;
                    if dream.parsed_timestamp() >= acc.latest.parsed_timestamp() {
                        acc.latest = dream;
                    }
                },
                None => {
                    projects.insert(
                        dream.project_path.clone(),
                        ProjectAccumulator { latest: dream, dream_count: 1, total_hours: hours },
                    );
                },
            }
        }
        drop(stream);

        for acc in projects.values() {
            let summary = ProjectSummary::from_dream(&acc.latest, acc.dream_count, acc.total_hours);
            self.repo.put_project(&summary).await?;
        }

        let mut removed = 0_usize;
        for summary in self.repo.list_projects().await? {
            if !projects.contains_key(&summary.path)
                && self.repo.delete_project(&summary.path).await?
            {
                removed = removed.saturating_add(1);
            }
        }

        let rebuilt = projects.len();
        tracing::info!(rebuilt, removed, "Project summaries rebuilt");
        Ok(RebuildReport {
            success: true,
            rebuilt,
            removed,
            message: format!("Rebuilt {rebuilt} project summaries"),
            timestamp: self.timestamp(),
        })
    }
}
