//! Storage accounting, quota guard, health check and source analysis.
//!
//! Byte usage is an estimate: the first few dreams are sampled for an
//! average size, multiplied by the dream count, plus a flat per-project
//! overhead. Development hours and categories come from a full scan.

#![allow(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "byte estimates are approximate and far below f64 mantissa limits"
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt as _;
use keendreams_core::{
    AVG_DREAMS_PER_DAY, CategoryCounts, DEFAULT_AVG_DREAM_SIZE, DREAM_SCHEMA_VERSION,
    DreamRecord, DreamsConfig, HEALTH_HIGH_DREAM_COUNT, HEALTH_STORAGE_WARNING_THRESHOLD,
    PROJECT_OVERHEAD_BYTES, QUOTA_WRITE_THRESHOLD, STATS_CACHE_KEY, STATS_SAMPLE_SIZE,
    SourceCategory, categorize_dream, take_chars,
};
use keendreams_storage::{DreamRepository, KvStore as _, Namespace};
use serde::{Deserialize, Serialize};

use crate::cache::{Cached, TtlCache};
use crate::clock::Clock;
use crate::error::ServiceError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = BYTES_PER_MB * 1024.0;
const ANALYSIS_SUMMARY_CHARS: usize = 100;
const ANALYSIS_SAMPLES_PER_CATEGORY: usize = 3;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Sampled size estimate of the whole store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageEstimate {
    pub dream_count: usize,
    pub project_count: usize,
    pub avg_dream_size: f64,
    pub total_bytes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByteAmount {
    pub bytes: i64,
    pub mb: f64,
    pub gb: f64,
}

impl ByteAmount {
    fn from_bytes(bytes: f64) -> Self {
        Self {
            bytes: bytes.round() as i64,
            mb: round_to(bytes / BYTES_PER_MB, 2),
            gb: round_to(bytes / BYTES_PER_GB, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub used: ByteAmount,
    pub remaining: ByteAmount,
    /// Used share of the limit in percent, formatted with three decimals.
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamTotals {
    pub total: usize,
    pub avg_size: u64,
    pub projects: usize,
    pub total_development_hours: f64,
    pub categories: CategoryCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityEstimates {
    pub years_remaining: i64,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub storage: StorageUsage,
    pub dreams: DreamTotals,
    pub estimates: CapacityEstimates,
    pub last_updated: String,
}

/// Result of the quota guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub has_space: bool,
    pub usage: String,
    pub limit: String,
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dreams: Option<DreamTotals>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: &'static str,
}

pub const HEALTH_ISSUE_STORAGE: &str = "Storage nearly full";
pub const HEALTH_ISSUE_DREAM_COUNT: &str = "High dream count may impact performance";
pub const HEALTH_ISSUE_ORPHANS: &str = "Possible orphaned project records";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisCounts {
    pub github: usize,
    pub claude: usize,
    pub chatgpt: usize,
    pub unknown: usize,
}

impl AnalysisCounts {
    fn record(&mut self, category: SourceCategory) {
        match category {
            SourceCategory::Github => self.github += 1,
            SourceCategory::Claude => self.claude += 1,
            SourceCategory::Chatgpt => self.chatgpt += 1,
            SourceCategory::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorFlags {
    pub has_commit_hash: bool,
    pub has_claude_version: bool,
    pub source: String,
    pub has_last_commit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamCategoryDetail {
    pub id: String,
    pub project_path: String,
    pub timestamp: String,
    pub category: SourceCategory,
    pub reason: &'static str,
    pub metadata: IndicatorFlags,
    pub summary: String,
}

impl DreamCategoryDetail {
    fn from_dream(dream: &DreamRecord) -> Self {
        let categorization = categorize_dream(dream);
        let summary = if dream.context.summary.is_empty() {
            "No summary".to_owned()
        } else {
            take_chars(&dream.context.summary, ANALYSIS_SUMMARY_CHARS)
        };
        Self {
            id: dream.id.clone(),
            project_path: dream.project_path.clone(),
            timestamp: dream.timestamp.clone(),
            category: categorization.category,
            reason: categorization.reason,
            metadata: IndicatorFlags {
                has_commit_hash: dream.commit_hash().is_some(),
                has_claude_version: dream.claude_version().is_some(),
                source: dream.source().unwrap_or("undefined").to_owned(),
                has_last_commit: dream.last_commit().is_some(),
            },
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAnalysis {
    pub total: usize,
    pub categories: AnalysisCounts,
    pub details: Vec<DreamCategoryDetail>,
    pub sample_dreams: BTreeMap<SourceCategory, Vec<DreamCategoryDetail>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAnalysisReport {
    pub timestamp: String,
    pub analysis: SourceAnalysis,
}

#[derive(Debug)]
pub struct StatsService {
    repo: Arc<DreamRepository>,
    cache: TtlCache,
    clock: Arc<dyn Clock>,
    storage_limit_bytes: u64,
}

impl StatsService {
    #[must_use]
    pub fn new(repo: Arc<DreamRepository>, clock: Arc<dyn Clock>, config: &DreamsConfig) -> Self {
        let cache = TtlCache::new(
            Arc::clone(&repo),
            Arc::clone(&clock),
            Duration::from_secs(config.stats_cache_ttl_secs),
        );
        Self { repo, cache, clock, storage_limit_bytes: config.storage_limit_bytes }
    }

    #[must_use]
    pub const fn storage_limit_bytes(&self) -> u64 {
        self.storage_limit_bytes
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// Two key enumerations plus a read of the first few dreams.
    pub async fn estimate_usage(&self) -> Result<UsageEstimate, ServiceError> {
        let dream_keys = self.repo.dream_keys().await?;
        let project_count = self.repo.project_keys().await?.len();

        let mut sampled = 0usize;
        let mut sample_bytes = 0usize;
        for key in dream_keys.iter().take(STATS_SAMPLE_SIZE) {
            if let Some(raw) = self.repo.store().get(Namespace::Dreams, key).await? {
                sampled += 1;
                sample_bytes += raw.len();
            }
        }
        let avg_dream_size = if sampled > 0 {
            sample_bytes as f64 / sampled as f64
        } else {
            DEFAULT_AVG_DREAM_SIZE
        };
        let total_bytes = dream_keys.len() as f64 * avg_dream_size
            + project_count as f64 * PROJECT_OVERHEAD_BYTES as f64;

        Ok(UsageEstimate {
            dream_count: dream_keys.len(),
            project_count,
            avg_dream_size,
            total_bytes,
        })
    }

    /// Full statistics: sampled size estimate plus a full scan for hours
    /// and categories.
    pub async fn compute_stats(&self) -> Result<StorageStats, ServiceError> {
        let estimate = self.estimate_usage().await?;

        let mut total_hours = 0.0;
        let mut categories = CategoryCounts::default();
        let mut dreams = self.repo.scan_dreams();
        while let Some(item) = dreams.next().await {
            let stored = item?;
            total_hours += stored.dream.duration_hours();
            categories.record(categorize_dream(&stored.dream).category);
        }

        let limit = self.storage_limit_bytes as f64;
        let remaining = limit - estimate.total_bytes;
        let percentage = if limit > 0.0 { estimate.total_bytes / limit * 100.0 } else { 100.0 };
        let days_remaining = (remaining / (AVG_DREAMS_PER_DAY * estimate.avg_dream_size)).floor();

        Ok(StorageStats {
            storage: StorageUsage {
                used: ByteAmount::from_bytes(estimate.total_bytes),
                remaining: ByteAmount::from_bytes(remaining),
                percentage: format!("{percentage:.3}"),
            },
            dreams: DreamTotals {
                total: estimate.dream_count,
                avg_size: estimate.avg_dream_size.round() as u64,
                projects: estimate.project_count,
                total_development_hours: round_to(total_hours, 2),
                categories,
            },
            estimates: CapacityEstimates {
                years_remaining: (days_remaining / 365.0).floor() as i64,
                days_remaining: days_remaining as i64,
            },
            last_updated: self.clock.now().to_rfc3339(),
        })
    }

    /// Stats served from the cache when fresh; recomputed otherwise, with
    /// the cache refreshed in the background.
    pub async fn stats(&self) -> Result<Cached<StorageStats>, ServiceError> {
        self.cache.get_or_compute(STATS_CACHE_KEY, || self.compute_stats()).await
    }

    /// Recomputes and waits for the cache write.
    pub async fn refresh_stats(&self) -> Result<StorageStats, ServiceError> {
        let stats = self.compute_stats().await?;
        self.cache.store(STATS_CACHE_KEY, &stats).await?;
        tracing::debug!(total = stats.dreams.total, "Stats cache refreshed");
        Ok(stats)
    }

    /// Writes are allowed while estimated usage stays below the threshold.
    pub async fn check_quota(&self) -> Result<QuotaStatus, ServiceError> {
        let estimate = self.estimate_usage().await?;
        let limit = self.storage_limit_bytes as f64;
        Ok(QuotaStatus {
            has_space: estimate.total_bytes < limit * QUOTA_WRITE_THRESHOLD,
            usage: format!("{:.3} GB", estimate.total_bytes / BYTES_PER_GB),
            limit: format!("{:.3} GB", limit / BYTES_PER_GB),
            used_bytes: estimate.total_bytes.round() as u64,
            limit_bytes: self.storage_limit_bytes,
        })
    }

    /// Composite health check. Never fails: a storage failure is reported
    /// as status `error`.
    pub async fn health(&self) -> HealthReport {
        let timestamp = self.clock.now().to_rfc3339();
        let stats = match self.compute_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                return HealthReport {
                    status: HealthStatus::Error,
                    timestamp,
                    storage: None,
                    dreams: None,
                    issues: Vec::new(),
                    error: Some("Health check failed".to_owned()),
                    version: DREAM_SCHEMA_VERSION,
                };
            },
        };

        let mut issues = Vec::new();
        let used_share = stats.storage.used.bytes as f64 / self.storage_limit_bytes.max(1) as f64;
        if used_share > HEALTH_STORAGE_WARNING_THRESHOLD {
            issues.push(HEALTH_ISSUE_STORAGE.to_owned());
        }
        if stats.dreams.total > HEALTH_HIGH_DREAM_COUNT {
            issues.push(HEALTH_ISSUE_DREAM_COUNT.to_owned());
        }
        if stats.dreams.projects as f64 > stats.dreams.total as f64 / 5.0 {
            issues.push(HEALTH_ISSUE_ORPHANS.to_owned());
        }

        HealthReport {
            status: if issues.is_empty() { HealthStatus::Healthy } else { HealthStatus::Warning },
            timestamp,
            storage: Some(stats.storage),
            dreams: Some(stats.dreams),
            issues,
            error: None,
            version: DREAM_SCHEMA_VERSION,
        }
    }

    /// Per-dream categorization with reasons and up to three samples per
    /// category.
    pub async fn analyze_sources(&self) -> Result<SourceAnalysisReport, ServiceError> {
        let total = self.repo.count_dreams().await?;
        let mut categories = AnalysisCounts::default();
        let mut details = Vec::new();
        let mut sample_dreams: BTreeMap<SourceCategory, Vec<DreamCategoryDetail>> =
            SourceCategory::ALL_VARIANTS.iter().map(|c| (*c, Vec::new())).collect();

        let mut dreams = self.repo.scan_dreams();
        while let Some(item) = dreams.next().await {
            let detail = DreamCategoryDetail::from_dream(&item?.dream);
            categories.record(detail.category);
            if let Some(samples) = sample_dreams.get_mut(&detail.category)
                && samples.len() < ANALYSIS_SAMPLES_PER_CATEGORY
            {
                samples.push(detail.clone());
            }
            details.push(detail);
        }

        Ok(SourceAnalysisReport {
            timestamp: self.clock.now().to_rfc3339(),
            analysis: SourceAnalysis { total, categories, details, sample_dreams },
        })
    }
}
