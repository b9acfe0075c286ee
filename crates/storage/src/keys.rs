//! Namespaces and key layout of the KV store.
//!
//! Dreams live under `dream:{projectPath}:{id}` and project summaries under
//! `project:{projectPath}`. A project path may itself contain ':'; dream ids
//! may not, so the id is always the segment after the last ':'.

use std::fmt;

/// Independent keyspaces of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Dreams,
    Projects,
    Cache,
}

impl Namespace {
    pub const ALL: [Self; 3] = [Self::Dreams, Self::Projects, Self::Cache];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dreams => "dreams",
            Self::Projects => "projects",
            Self::Cache => "cache",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DREAM_KEY_PREFIX: &str = "dream:";
pub const PROJECT_KEY_PREFIX: &str = "project:";

#[must_use]
pub fn dream_key(project_path: &str, id: &str) -> String {
    format!("{DREAM_KEY_PREFIX}{project_path}:{id}")
}

/// Prefix matching every dream of one project.
#[must_use]
pub fn project_dreams_prefix(project_path: &str) -> String {
    format!("{DREAM_KEY_PREFIX}{project_path}:")
}

#[must_use]
pub fn project_key(project_path: &str) -> String {
    format!("{PROJECT_KEY_PREFIX}{project_path}")
}

/// Parsed form of a dream key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DreamKey<'a> {
    pub project_path: &'a str,
    pub id: &'a str,
}

impl<'a> DreamKey<'a> {
    #[must_use]
    pub fn parse(key: &'a str) -> Option<Self> {
        let rest = key.strip_prefix(DREAM_KEY_PREFIX)?;
        let (project_path, id) = rest.rsplit_once(':')?;
        if project_path.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self { project_path, id })
    }
}

/// Project path encoded in a project key.
#[must_use]
pub fn parse_project_key(key: &str) -> Option<&str> {
    key.strip_prefix(PROJECT_KEY_PREFIX).filter(|p| !p.is_empty())
}
