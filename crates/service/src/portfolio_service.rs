//! Read-only views across all dreams: keyword search, portfolio overview,
//! per-project briefing, working preferences and project locations.

#![allow(clippy::float_arithmetic, reason = "Hour totals and averages are float math")]
#![allow(clippy::as_conversions, reason = "usize to f64 for averages is lossless in practice")]
#![allow(clippy::cast_precision_loss, reason = "Counts stay far below f64 precision limits")]

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::StreamExt as _;
use keendreams_core::{
    ACTIVE_PROJECT_DAYS, DreamRecord, KeyMoment, KeywordQuery, LocationSummary, MAX_QUERY_LIMIT,
    PORTFOLIO_PROJECT_LIMIT, PREFERENCES_DREAM_LIMIT, ProjectLocationReport, SNIPPET_MAX_CHARS,
    analyze_project_location, non_empty, summarize_locations, take_chars,
};
use keendreams_storage::DreamRepository;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::ServiceError;

const ACTIVE_PROJECTS_SHOWN: usize = 5;
const TOP_TECHNOLOGIES: usize = 10;
const TECHNOLOGY_FOCUS: usize = 3;
const COMMON_COMMANDS: usize = 5;
const FREQUENT_FILES: usize = 10;
const KEY_MOMENTS_PER_DREAM: usize = 2;
const KEY_ACHIEVEMENTS: usize = 5;
const IMPORTANT_NOTES: usize = 3;
const IMPORTANT_NOTE_CHARS: usize = 100;
const RECENT_WORK_CHARS: usize = 200;
const PREFERRED_STACK: usize = 8;
const PREFERRED_COMMANDS: usize = 10;

/// Command sequences recognized as a named workflow, checked in order.
const WORKFLOWS: &[(&[&str], &str)] = &[
    (&["npm run build", "npm run deploy"], "Build & Deploy"),
    (&["git add", "git commit", "git push"], "Git Workflow"),
    (&["npm install"], "Dependency Installation"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitMetadata {
    pub duration: f64,
    pub tech_stack: Vec<String>,
    pub has_code: bool,
    pub key_moments_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub dream_id: String,
    pub project_name: String,
    pub timestamp: String,
    pub score: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub snippet: String,
    pub metadata: SearchHitMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    /// Matches before the limit was applied.
    pub total_results: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioProject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub dream_count: usize,
    pub total_hours: f64,
    pub tech_stack: Vec<String>,
    pub last_activity: String,
    pub recent_summary: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechUsage {
    pub tech: String,
    pub project_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInsights {
    pub most_active_project: String,
    pub average_session_hours: f64,
    pub technology_focus: Vec<String>,
    pub recent_trend: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioContext {
    pub quick_overview: String,
    pub tech_stack: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOverview {
    pub total_projects: usize,
    pub total_dreams: usize,
    pub active_project_count: usize,
    pub active_projects: Vec<PortfolioProject>,
    pub total_development_hours: f64,
    pub preferred_technologies: Vec<TechUsage>,
    pub projects: Vec<PortfolioProject>,
    pub projects_by_type: BTreeMap<String, Vec<PortfolioProject>>,
    pub insights: PortfolioInsights,
    pub claude_context: PortfolioContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub last_commit: String,
    pub branch: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentContext {
    pub last_session: String,
    pub current_focus: String,
    pub active_tasks: Vec<String>,
    pub known_issues: Vec<String>,
    pub git_status: GitStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequentItem {
    pub item: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatterns {
    pub common_commands: Vec<FrequentItem>,
    pub frequent_files: Vec<String>,
    pub key_achievements: Vec<KeyMoment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub quick_start: String,
    pub recent_work: String,
    pub typical_workflow: &'static str,
    pub important_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tech_stack: Vec<String>,
    pub total_dreams: usize,
    pub total_development_hours: f64,
    pub current_context: CurrentContext,
    pub patterns: ProjectPatterns,
    pub claude_context: ProjectContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyUsage {
    pub technology: String,
    pub usage: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandUsage {
    pub command: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub project_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyPreferences {
    pub preferred_stack: Vec<TechnologyUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingPatterns {
    pub preferred_commands: Vec<CommandUsage>,
    pub project_types: Vec<ProjectTypeCount>,
    pub average_session_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub technology_preferences: TechnologyPreferences,
    pub working_patterns: WorkingPatterns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsReport {
    pub timestamp: String,
    pub total_projects: usize,
    pub summary: LocationSummary,
    pub projects: Vec<ProjectLocationReport>,
}

/// Counts occurrences and ranks them by count, descending. Ties keep
/// first-seen order.
fn rank_by_frequency<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match index.get(&item) {
            Some(&slot) => {
                if let Some(entry) = counts.get_mut(slot) {
                    entry.1 = entry.1.saturating_add(1);
                }
            },
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            },
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn push_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn typical_workflow(commands: &[String]) -> &'static str {
    WORKFLOWS
        .iter()
        .find(|(pattern, _)| {
            pattern.iter().all(|needle| commands.iter().any(|c| c.contains(needle)))
        })
        .map_or("Custom workflow", |(_, name)| name)
}

fn important_notes(dreams: &[DreamRecord]) -> Vec<String> {
    let mut notes = Vec::new();
    for dream in dreams {
        if let Some(first) = dream.conversation.blockers.as_ref().and_then(|b| b.first()) {
            notes.push(first.clone());
        }
        if let Some(custom) = dream.custom_notes()
            && custom.to_lowercase().contains("important")
        {
            notes.push(take_chars(custom, IMPORTANT_NOTE_CHARS));
        }
    }
    notes.truncate(IMPORTANT_NOTES);
    notes
}

struct ProjectActivity {
    kind: String,
    dream_count: usize,
    total_hours: f64,
    tech_stack: Vec<String>,
    last_activity: String,
    last_activity_at: Option<DateTime<Utc>>,
    recent_summary: String,
}

#[derive(Debug)]
pub struct PortfolioService {
    repo: Arc<DreamRepository>,
    clock: Arc<dyn Clock>,
}

impl PortfolioService {
    #[must_use]
    pub const fn new(repo: Arc<DreamRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    fn is_recent(&self, at: Option<DateTime<Utc>>) -> bool {
        let cutoff = self.clock.now() - TimeDelta::days(ACTIVE_PROJECT_DAYS);
        at.is_some_and(|at| at > cutoff)
    }

    /// Weighted keyword search over every dream, optionally restricted to
    /// one project name.
    pub async fn search(
        &self,
        query: &str,
        project_filter: Option<&str>,
        limit: usize,
    ) -> Result<SearchResults, ServiceError> {
        let keywords = KeywordQuery::parse(query)
            .ok_or_else(|| ServiceError::InvalidInput("Query parameter 'q' is required".into()))?;

        let mut hits = Vec::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let dream = item?.dream;
            if project_filter.is_some_and(|name| dream.project_name != name) {
                continue;
            }
            let matched = keywords.score(&dream);
            if matched.score == 0 {
                continue;
            }
            let snippet = matched.snippet.unwrap_or_else(|| {
                if dream.context.summary.is_empty() {
                    "No summary available".to_owned()
                } else {
                    take_chars(&dream.context.summary, SNIPPET_MAX_CHARS)
                }
            });
            hits.push(SearchHit {
                metadata: SearchHitMetadata {
                    duration: dream.duration_hours(),
                    tech_stack: dream.context.tech_stack.clone(),
                    has_code: !dream.conversation.code_changes.is_empty(),
                    key_moments_count: dream.conversation.key_moments.len(),
                },
                dream_id: dream.id,
                project_name: dream.project_name,
                timestamp: dream.timestamp,
                score: matched.score,
                kind: "conversation",
                snippet,
            });
        }

        let total_results = hits.len();
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit.clamp(1, MAX_QUERY_LIMIT));
        tracing::debug!(query, total_results, "Search finished");
        Ok(SearchResults { query: query.to_owned(), total_results, results: hits })
    }

    /// Per-project activity profile of the whole store.
    pub async fn portfolio(&self) -> Result<PortfolioOverview, ServiceError> {
        let total_dreams = self.repo.count_dreams().await?;
        let mut order: Vec<String> = Vec::new();
        let mut activity: HashMap<String, ProjectActivity> = HashMap::new();

        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let dream = item?.dream;
            let at = dream.parsed_timestamp();
            let project = activity.entry(dream.project_name.clone()).or_insert_with(|| {
                order.push(dream.project_name.clone());
                ProjectActivity {
                    kind: dream.project_type().to_owned(),
                    dream_count: 0,
                    total_hours: 0.0,
                    tech_stack: Vec::new(),
                    last_activity: dream.timestamp.clone(),
                    last_activity_at: at,
                    recent_summary: dream.context.summary.clone(),
                }
            });
            project.dream_count = project.dream_count.saturating_add(1);
            project.total_hours += dream.duration_hours();
            push_unique(&mut project.tech_stack, &dream.context.tech_stack);
            if at > project.last_activity_at {
                project.last_activity.clone_from(&dream.timestamp);
                project.last_activity_at = at;
                project.recent_summary.clone_from(&dream.context.summary);
            }
        }
        drop(stream);

        let mut ranked: Vec<(Option<DateTime<Utc>>, PortfolioProject)> = order
            .into_iter()
            .filter_map(|name| {
                let data = activity.remove(&name)?;
                let project = PortfolioProject {
                    is_active: self.is_recent(data.last_activity_at),
                    name,
                    kind: data.kind,
                    dream_count: data.dream_count,
                    total_hours: round_tenths(data.total_hours),
                    tech_stack: data.tech_stack,
                    last_activity: data.last_activity,
                    recent_summary: data.recent_summary,
                };
                Some((data.last_activity_at, project))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        let projects: Vec<PortfolioProject> = ranked.into_iter().map(|(_, p)| p).collect();

        let top_tech: Vec<TechUsage> =
            rank_by_frequency(projects.iter().flat_map(|p| p.tech_stack.iter().cloned()))
                .into_iter()
                .take(TOP_TECHNOLOGIES)
                .map(|(tech, project_count)| TechUsage { tech, project_count })
                .collect();
        let focus: Vec<String> =
            top_tech.iter().take(TECHNOLOGY_FOCUS).map(|t| t.tech.clone()).collect();

        let active: Vec<&PortfolioProject> = projects.iter().filter(|p| p.is_active).collect();
        let recent_trend = if active.is_empty() {
            "No recent activity".to_owned()
        } else {
            rank_by_frequency(active.iter().flat_map(|p| p.tech_stack.iter().cloned()))
                .first()
                .map_or_else(
                    || "Mixed technology work".to_owned(),
                    |(tech, _)| format!("Recent focus on {tech}"),
                )
        };

        let total_development_hours: f64 = projects.iter().map(|p| p.total_hours).sum();
        let mut projects_by_type: BTreeMap<String, Vec<PortfolioProject>> = BTreeMap::new();
        for project in &projects {
            projects_by_type.entry(project.kind.clone()).or_default().push(project.clone());
        }

        let leader = projects.first();
        Ok(PortfolioOverview {
            total_projects: projects.len(),
            total_dreams,
            active_project_count: active.len(),
            active_projects: active.iter().take(ACTIVE_PROJECTS_SHOWN).map(|p| (*p).clone()).collect(),
            total_development_hours,
            preferred_technologies: top_tech,
            insights: PortfolioInsights {
                most_active_project: leader.map_or_else(|| "None".to_owned(), |p| p.name.clone()),
                average_session_hours: total_development_hours / projects.len().max(1) as f64,
                technology_focus: focus.clone(),
                recent_trend,
            },
            claude_context: PortfolioContext {
                quick_overview: format!(
                    "Portfolio of {} projects. Most active: {} ({} project)",
                    projects.len(),
                    leader.map_or("Unknown", |p| p.name.as_str()),
                    leader.map_or("unknown", |p| p.kind.as_str()),
                ),
                tech_stack: format!("Primary technologies: {}", focus.join(", ")),
            },
            projects: projects.into_iter().take(PORTFOLIO_PROJECT_LIMIT).collect(),
            projects_by_type,
        })
    }

    /// Briefing for the project with exactly this name. `None` when no
    /// dream carries the name.
    pub async fn project_details(&self, name: &str) -> Result<Option<ProjectDetails>, ServiceError> {
        let mut dreams = Vec::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let dream = item?.dream;
            if dream.project_name == name {
                dreams.push(dream);
            }
        }
        drop(stream);

        dreams.sort_by(|a, b| b.parsed_timestamp().cmp(&a.parsed_timestamp()));
        let Some(latest) = dreams.first() else {
            return Ok(None);
        };

        let mut tech_stack = Vec::new();
        let mut commands = Vec::new();
        let mut files: Vec<String> = Vec::new();
        let mut moments = Vec::new();
        for dream in &dreams {
            push_unique(&mut tech_stack, &dream.context.tech_stack);
            commands.extend(
                dream
                    .conversation
                    .command_history
                    .iter()
                    .filter(|c| c.successful)
                    .map(|c| c.command.clone()),
            );
            for change in &dream.conversation.code_changes {
                if !files.contains(&change.file) {
                    files.push(change.file.clone());
                }
            }
            moments.extend(
                dream.conversation.key_moments.iter().take(KEY_MOMENTS_PER_DREAM).cloned(),
            );
        }
        files.truncate(FREQUENT_FILES);
        moments.truncate(KEY_ACHIEVEMENTS);

        let total_hours: f64 = dreams.iter().map(DreamRecord::duration_hours).sum();
        let described_type = non_empty(latest.metadata.project_type.as_ref()).unwrap_or("development");
        let recent_work = if latest.context.summary.is_empty() {
            "No recent summary available".to_owned()
        } else {
            take_chars(&latest.context.summary, RECENT_WORK_CHARS)
        };

        Ok(Some(ProjectDetails {
            name: name.to_owned(),
            kind: latest.project_type().to_owned(),
            total_dreams: dreams.len(),
            total_development_hours: round_tenths(total_hours),
            current_context: CurrentContext {
                last_session: latest.timestamp.clone(),
                current_focus: latest.context.summary.clone(),
                active_tasks: latest.context.current_tasks.clone(),
                known_issues: latest.conversation.blockers.clone().unwrap_or_default(),
                git_status: GitStatus {
                    last_commit: latest.last_commit().unwrap_or_default().to_owned(),
                    branch: "main",
                },
            },
            claude_context: ProjectContext {
                quick_start: format!(
                    "This is {name}, a {described_type} project using {}",
                    tech_stack.join(", ")
                ),
                recent_work,
                typical_workflow: typical_workflow(&commands),
                important_notes: important_notes(&dreams),
            },
            patterns: ProjectPatterns {
                common_commands: rank_by_frequency(commands)
                    .into_iter()
                    .take(COMMON_COMMANDS)
                    .map(|(item, count)| FrequentItem { item, count })
                    .collect(),
                frequent_files: files,
                key_achievements: moments,
            },
            tech_stack,
        }))
    }

    /// Technology and command habits over the first dreams in key order.
    pub async fn preferences(&self) -> Result<Preferences, ServiceError> {
        let page = self.repo.dreams_page(None, PREFERENCES_DREAM_LIMIT).await?;
        let dreams: Vec<DreamRecord> = page.dreams.into_iter().map(|s| s.dream).collect();

        let preferred_stack = rank_by_frequency(
            dreams.iter().flat_map(|d| d.context.tech_stack.iter().cloned()),
        )
        .into_iter()
        .take(PREFERRED_STACK)
        .map(|(technology, usage)| TechnologyUsage { technology, usage })
        .collect();

        let preferred_commands = rank_by_frequency(dreams.iter().flat_map(|d| {
            d.conversation
                .command_history
                .iter()
                .filter(|c| c.successful)
                .map(|c| c.command.split(' ').next().unwrap_or_default().to_owned())
        }))
        .into_iter()
        .take(PREFERRED_COMMANDS)
        .map(|(command, frequency)| CommandUsage { command, frequency })
        .collect();

        let project_types = rank_by_frequency(
            dreams.iter().filter_map(|d| non_empty(d.metadata.project_type.as_ref())).map(str::to_owned),
        )
        .into_iter()
        .map(|(kind, project_count)| ProjectTypeCount { kind, project_count })
        .collect();

        let average_session_length = if dreams.is_empty() {
            0.0
        } else {
            dreams.iter().map(DreamRecord::duration_hours).sum::<f64>() / dreams.len() as f64
        };

        Ok(Preferences {
            technology_preferences: TechnologyPreferences { preferred_stack },
            working_patterns: WorkingPatterns {
                preferred_commands,
                project_types,
                average_session_length,
            },
        })
    }

    /// Location heuristics for the first dream seen of each project name.
    pub async fn locations(&self) -> Result<LocationsReport, ServiceError> {
        let mut seen: Vec<String> = Vec::new();
        let mut projects = Vec::new();
        let mut stream = self.repo.scan_dreams();
        while let Some(item) = stream.next().await {
            let dream = item?.dream;
            if seen.contains(&dream.project_name) {
                continue;
            }
            seen.push(dream.project_name.clone());
            projects.push(analyze_project_location(&dream));
        }
        drop(stream);

        Ok(LocationsReport {
            timestamp: self.clock.now().to_rfc3339(),
            total_projects: projects.len(),
            summary: summarize_locations(&projects),
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_by_frequency_breaks_ties_by_first_seen() {
        let ranked = rank_by_frequency(["b", "a", "a", "c", "b", "d"]);
        assert_eq!(ranked, vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn typical_workflow_requires_every_step() {
        let build_only = vec!["npm run build".to_owned()];
        assert_eq!(typical_workflow(&build_only), "Custom workflow");

        let git = vec![
            "git add .".to_owned(),
            "git commit -m wip".to_owned(),
            "git push origin main".to_owned(),
        ];
        assert_eq!(typical_workflow(&git), "Git Workflow");

        let both = vec![
            "npm run build".to_owned(),
            "npm run deploy".to_owned(),
            "npm install".to_owned(),
        ];
        assert_eq!(typical_workflow(&both), "Build & Deploy");
    }

    #[test]
    fn important_notes_caps_at_three() {
        let mut dream = DreamRecord::default();
        dream.conversation.blockers = Some(vec!["flaky CI".to_owned(), "second".to_owned()]);
        dream.context.custom_notes = Some("IMPORTANT: rotate the keys".to_owned());
        let notes = important_notes(&[dream.clone(), dream]);
        assert_eq!(notes, vec!["flaky CI", "IMPORTANT: rotate the keys", "flaky CI"]);
    }

    #[test]
    fn round_tenths_rounds_half_up() {
        assert!((round_tenths(1.25) - 1.3).abs() < f64::EPSILON);
        assert!((round_tenths(0.04) - 0.0).abs() < f64::EPSILON);
    }
}
