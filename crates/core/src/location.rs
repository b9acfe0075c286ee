//! Text heuristics guessing where a project lives and whether it is deployed.
//!
//! Everything here is inferred from dream text and metadata; nothing touches
//! the filesystem or the network.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::DreamRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    GitTracked,
    LocalProject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLocation {
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub is_local: bool,
    pub has_remote_repo: bool,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentState {
    LikelyDeployed,
    LocalDevelopment,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
    pub status: DeploymentState,
    pub platforms: Vec<&'static str>,
    pub confidence: Confidence,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectUrls {
    pub development: Option<String>,
    pub production: Option<String>,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub has_repo: bool,
    pub platform: Option<&'static str>,
    pub last_commit: Option<String>,
}

/// Location analysis for one project, based on its first scanned dream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLocationReport {
    pub name: String,
    pub location: ProjectLocation,
    pub deployment_status: DeploymentStatus,
    pub urls: ProjectUrls,
    pub repository: RepositoryInfo,
    pub last_analyzed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub local_only: usize,
    pub has_remote_repo: usize,
    pub likely_deployed: usize,
    pub platform_counts: BTreeMap<&'static str, usize>,
}

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static DEPLOYMENT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)cloudflare|workers\.dev|edge computing", "cloudflare-workers"),
        (r"(?i)vercel", "vercel"),
        (r"(?i)netlify", "netlify"),
        (r"(?i)heroku", "heroku"),
        (r"(?i)deploy|production", "generic-deployment"),
    ]
    .into_iter()
    .map(|(pattern, platform)| (Regex::new(pattern).unwrap(), platform))
    .collect()
});

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static PRODUCTION_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://[^.\s]+\.(?:workers\.dev|vercel\.app|netlify\.app)").unwrap()
});

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static REPOSITORY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https://github\.com/\S+").unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static DEVELOPMENT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)localhost:\d+").unwrap());

const REPOSITORY_PLATFORMS: &[&str] = &["github", "gitlab", "bitbucket"];

fn has_git_provenance(dream: &DreamRecord) -> bool {
    dream.metadata.is_git_generated == Some(true) || dream.commit_hash().is_some()
}

fn searchable_text(dream: &DreamRecord) -> String {
    [
        dream.context.summary.as_str(),
        dream.custom_notes().unwrap_or(""),
        dream.last_commit().unwrap_or(""),
    ]
    .join(" ")
}

#[must_use]
pub fn analyze_location(dream: &DreamRecord) -> ProjectLocation {
    if has_git_provenance(dream) {
        ProjectLocation {
            kind: LocationType::GitTracked,
            is_local: false,
            has_remote_repo: true,
            confidence: Confidence::High,
        }
    } else if dream.last_commit().is_some() {
        ProjectLocation {
            kind: LocationType::GitTracked,
            is_local: false,
            has_remote_repo: true,
            confidence: Confidence::Medium,
        }
    } else {
        ProjectLocation {
            kind: LocationType::LocalProject,
            is_local: true,
            has_remote_repo: false,
            confidence: Confidence::Medium,
        }
    }
}

#[must_use]
pub fn analyze_deployment(dream: &DreamRecord) -> DeploymentStatus {
    let text = searchable_text(dream).to_lowercase();
    let platforms: Vec<&'static str> = DEPLOYMENT_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(&text))
        .map(|(_, platform)| *platform)
        .collect();
    let evidence =
        platforms.iter().map(|p| format!("Found {p} indicators in dream content")).collect();

    let (status, confidence) = if !platforms.is_empty() {
        (DeploymentState::LikelyDeployed, Confidence::Medium)
    } else if text.contains("local") {
        (DeploymentState::LocalDevelopment, Confidence::Medium)
    } else {
        (DeploymentState::Unknown, Confidence::Low)
    };
    DeploymentStatus { status, platforms, confidence, evidence }
}

#[must_use]
pub fn extract_urls(dream: &DreamRecord) -> ProjectUrls {
    let text = searchable_text(dream);
    let first = |re: &Regex| re.find(&text).map(|m| m.as_str().to_owned());
    ProjectUrls {
        development: first(&DEVELOPMENT_URL),
        production: first(&PRODUCTION_URL),
        repository: first(&REPOSITORY_URL),
    }
}

#[must_use]
pub fn analyze_repository(dream: &DreamRecord) -> RepositoryInfo {
    let last_commit = dream.last_commit().map(str::to_owned);
    if !has_git_provenance(dream) {
        return RepositoryInfo { has_repo: false, platform: None, last_commit };
    }
    let text = format!("{} {}", dream.context.summary, dream.custom_notes().unwrap_or(""));
    let platform = REPOSITORY_PLATFORMS.iter().copied().find(|p| text.contains(p));
    RepositoryInfo { has_repo: true, platform, last_commit }
}

#[must_use]
pub fn analyze_project_location(dream: &DreamRecord) -> ProjectLocationReport {
    ProjectLocationReport {
        name: dream.project_name.clone(),
        location: analyze_location(dream),
        deployment_status: analyze_deployment(dream),
        urls: extract_urls(dream),
        repository: analyze_repository(dream),
        last_analyzed: dream.timestamp.clone(),
    }
}

#[must_use]
pub fn summarize_locations(reports: &[ProjectLocationReport]) -> LocationSummary {
    let mut summary = LocationSummary::default();
    for report in reports {
        if report.location.is_local {
            summary.local_only += 1;
        }
        if report.location.has_remote_repo {
            summary.has_remote_repo += 1;
        }
        if report.deployment_status.status == DeploymentState::LikelyDeployed {
            summary.likely_deployed += 1;
        }
        for platform in &report.deployment_status.platforms {
            *summary.platform_counts.entry(*platform).or_default() += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dream(summary: &str) -> DreamRecord {
        let mut dream = DreamRecord { project_name: "app".to_owned(), ..DreamRecord::default() };
        dream.context.summary = summary.to_owned();
        dream
    }

    #[test]
    fn commit_hash_means_git_tracked_high_confidence() {
        let mut d = dream("anything");
        d.metadata.commit_hash = Some("abc".to_owned());
        let location = analyze_location(&d);
        assert_eq!(location.kind, LocationType::GitTracked);
        assert_eq!(location.confidence, Confidence::High);
    }

    #[test]
    fn no_git_markers_means_local() {
        let location = analyze_location(&dream("anything"));
        assert!(location.is_local);
        assert_eq!(location.kind, LocationType::LocalProject);
    }

    #[test]
    fn deployment_platforms_are_detected() {
        let status = analyze_deployment(&dream("Pushed the worker to Cloudflare production"));
        assert_eq!(status.status, DeploymentState::LikelyDeployed);
        assert_eq!(status.platforms, vec!["cloudflare-workers", "generic-deployment"]);
        assert_eq!(status.evidence.len(), 2);
    }

    #[test]
    fn localhost_mentions_mean_local_development() {
        let status = analyze_deployment(&dream("Testing on localhost only"));
        assert_eq!(status.status, DeploymentState::LocalDevelopment);
    }

    #[test]
    fn urls_are_extracted_by_kind() {
        let urls = extract_urls(&dream(
            "Live at https://dreams.workers.dev, code at https://github.com/me/dreams, dev on localhost:8787",
        ));
        assert_eq!(urls.production.as_deref(), Some("https://dreams.workers.dev"));
        assert_eq!(urls.repository.as_deref(), Some("https://github.com/me/dreams,"));
        assert_eq!(urls.development.as_deref(), Some("localhost:8787"));
    }

    #[test]
    fn repository_platform_requires_git_provenance() {
        let mut d = dream("mirrored on gitlab");
        assert!(!analyze_repository(&d).has_repo);
        d.metadata.is_git_generated = Some(true);
        let repo = analyze_repository(&d);
        assert!(repo.has_repo);
        assert_eq!(repo.platform, Some("gitlab"));
    }

    #[test]
    fn summary_counts_platforms() {
        let reports = vec![
            analyze_project_location(&dream("deployed to vercel")),
            analyze_project_location(&dream("vercel preview")),
        ];
        let summary = summarize_locations(&reports);
        assert_eq!(summary.local_only, 2);
        assert_eq!(summary.likely_deployed, 2);
        assert_eq!(summary.platform_counts.get("vercel"), Some(&2));
        assert_eq!(summary.platform_counts.get("generic-deployment"), Some(&1));
    }
}
