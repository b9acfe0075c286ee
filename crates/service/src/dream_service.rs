//! Dream ingestion and direct reads.

use std::cmp::Reverse;
use std::sync::Arc;

use keendreams_core::{
    DreamRecord, MAX_QUERY_LIMIT, ProjectSummary, generate_dream_id, render_dream_summary,
    validate_dream,
};
use keendreams_storage::keys::dream_key;
use keendreams_storage::{DreamRepository, KvStore as _, Namespace};
use serde::Serialize;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::stats_service::StatsService;

/// Result of a write attempt that passed validation and the quota guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored { dream_id: String, quality_score: u8, storage_used: String },
    /// A dream with the same project and commit hash (or the same key)
    /// already exists; nothing was written.
    Duplicate { existing_dream_id: String },
}

/// Latest dream of a project, resolved through its summary.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestDream {
    Found(Box<DreamRecord>),
    ProjectNotFound,
    /// The summary points at a dream that no longer exists.
    DreamMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamListing {
    pub dreams: Vec<DreamRecord>,
    pub total: usize,
    pub has_more: bool,
    pub cursor: Option<String>,
}

#[derive(Debug)]
pub struct DreamService {
    repo: Arc<DreamRepository>,
    stats: Arc<StatsService>,
    clock: Arc<dyn Clock>,
}

impl DreamService {
    #[must_use]
    pub const fn new(
        repo: Arc<DreamRepository>,
        stats: Arc<StatsService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, stats, clock }
    }

    /// Decode, validate, dedup, quota-check, score and persist a dream.
    ///
    /// The dream and its project summary are two independent writes. A
    /// failed summary update is logged and does not fail the ingest, since
    /// the summary can be rebuilt from the dreams.
    pub async fn ingest(&self, payload: serde_json::Value) -> Result<IngestOutcome, ServiceError> {
        let mut dream =
            DreamRecord::decode(payload).map_err(|e| ServiceError::Validation(vec![e.to_string()]))?;
        if dream.id.is_empty() {
            dream.id = generate_dream_id(self.clock.now());
        }

        let validation = validate_dream(&dream);
        if !validation.is_valid {
            return Err(ServiceError::Validation(validation.issues));
        }

        if let Some(commit_hash) = dream.commit_hash() {
            if let Some(existing) = self.repo.find_duplicate(&dream.project_path, commit_hash).await?
            {
                tracing::info!(
                    project = %dream.project_path,
                    commit_hash,
                    existing_id = %existing.id,
                    "Duplicate dream rejected"
                );
                return Ok(IngestOutcome::Duplicate { existing_dream_id: existing.id });
            }
        }

        let key = dream_key(&dream.project_path, &dream.id);
        if self.repo.store().get(Namespace::Dreams, &key).await?.is_some() {
            tracing::info!(key = %key, "Dream id already stored, keeping the original");
            return Ok(IngestOutcome::Duplicate { existing_dream_id: dream.id });
        }

        let quota = self.stats.check_quota().await?;
        if !quota.has_space {
            tracing::warn!(usage = %quota.usage, limit = %quota.limit, "Storage quota exceeded");
            return Err(ServiceError::QuotaExceeded(quota));
        }

        let dream = dream.with_computed_metadata();
        let quality_score = dream.metadata.quality_score.unwrap_or_default();
        self.repo.put_dream(&dream).await?;

        if let Err(e) = self.update_project_summary(&dream).await {
            tracing::warn!(
                project = %dream.project_path,
                error = %e,
                "Project summary update failed; dream is stored"
            );
        }

        tracing::info!(
            dream_id = %dream.id,
            project = %dream.project_path,
            quality_score,
            "Dream captured"
        );
        Ok(IngestOutcome::Stored { dream_id: dream.id, quality_score, storage_used: quota.usage })
    }

    async fn update_project_summary(&self, dream: &DreamRecord) -> Result<(), ServiceError> {
        let previous_hours = self
            .repo
            .get_project(&dream.project_path)
            .await?
            .map_or(0.0, |summary| summary.total_dev_hours);
        let dream_count = self.repo.count_project_dreams(&dream.project_path).await?;
        let summary =
            ProjectSummary::from_dream(dream, dream_count, previous_hours + dream.duration_hours());
        self.repo.put_project(&summary).await?;
        Ok(())
    }

    pub async fn get_dream(&self, id: &str) -> Result<Option<DreamRecord>, ServiceError> {
        Ok(self.repo.find_dream_by_id(id).await?)
    }

    pub async fn latest_dream(&self, project_path: &str) -> Result<LatestDream, ServiceError> {
        let Some(project) = self.repo.get_project(project_path).await? else {
            return Ok(LatestDream::ProjectNotFound);
        };
        Ok(match self.repo.get_dream(project_path, &project.last_dream).await? {
            Some(dream) => LatestDream::Found(Box::new(dream)),
            None => LatestDream::DreamMissing,
        })
    }

    /// Markdown briefing of the latest dream, when one exists.
    pub async fn summary_markdown(
        &self,
        project_path: &str,
    ) -> Result<Result<String, LatestDream>, ServiceError> {
        Ok(match self.latest_dream(project_path).await? {
            LatestDream::Found(dream) => Ok(render_dream_summary(&dream)),
            missing => Err(missing),
        })
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ServiceError> {
        Ok(self.repo.list_projects().await?)
    }

    /// One page of dreams, newest first within the page.
    pub async fn list_dreams(
        &self,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<DreamListing, ServiceError> {
        let page = self.repo.dreams_page(cursor, limit.clamp(1, MAX_QUERY_LIMIT)).await?;
        let mut dreams: Vec<DreamRecord> = page.dreams.into_iter().map(|s| s.dream).collect();
        dreams.sort_by_key(|d| Reverse(d.parsed_timestamp()));
        Ok(DreamListing {
            total: dreams.len(),
            dreams,
            has_more: !page.list_complete,
            cursor: page.cursor,
        })
    }
}
