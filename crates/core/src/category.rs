//! Source classification of dreams (which tool produced them).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DreamError, DreamRecord};

/// Tool a dream most likely originated from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    /// Seeded from git history (commit hash or last commit present).
    Github,
    /// Captured from a Claude session.
    Claude,
    /// Explicitly tagged as coming from ChatGPT.
    Chatgpt,
    /// No indicator matched.
    Unknown,
}

impl SourceCategory {
    pub const ALL_VARIANTS: &'static [SourceCategory] =
        &[Self::Github, Self::Claude, Self::Chatgpt, Self::Unknown];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Github => "github",
            Self::Claude => "claude",
            Self::Chatgpt => "chatgpt",
            Self::Unknown => "unknown",
        }
    }

    /// Category used by the aggregate stats, which have no "unknown" bucket:
    /// the reference deployment's sources skew Claude.
    #[must_use]
    pub const fn or_claude(self) -> Self {
        match self {
            Self::Unknown => Self::Claude,
            other => other,
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceCategory {
    type Err = DreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::Github),
            "claude" => Ok(Self::Claude),
            "chatgpt" => Ok(Self::Chatgpt),
            "unknown" => Ok(Self::Unknown),
            other => Err(DreamError::UnknownCategory(other.to_owned())),
        }
    }
}

/// A category together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categorization {
    pub category: SourceCategory,
    pub reason: &'static str,
}

const SESSION_PHRASES: &[&str] = &["Working on", "Implementing"];

/// Classifies a dream by the first matching indicator, in priority order:
/// commit hash, explicit ChatGPT source, Claude version, last commit,
/// session-style summary phrasing.
#[must_use]
pub fn categorize_dream(dream: &DreamRecord) -> Categorization {
    let (category, reason) = if dream.commit_hash().is_some() {
        (SourceCategory::Github, "Has commitHash metadata (git seeded)")
    } else if dream.source() == Some("chatgpt") {
        (SourceCategory::Chatgpt, "Explicit ChatGPT source")
    } else if dream.claude_version().is_some() {
        (SourceCategory::Claude, "Has claudeVersion metadata (Claude session)")
    } else if dream.last_commit().is_some() {
        (SourceCategory::Github, "Has lastCommit field (git context)")
    } else if SESSION_PHRASES.iter().any(|p| dream.context.summary.contains(p)) {
        (SourceCategory::Claude, "Session-style summary (likely Claude)")
    } else {
        (SourceCategory::Unknown, "No clear indicators")
    };
    Categorization { category, reason }
}

/// Per-category dream counts as reported by `/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub github: usize,
    pub claude: usize,
    pub chatgpt: usize,
}

impl CategoryCounts {
    /// Counts the dream under its stats category (unknown folds into claude).
    pub fn record(&mut self, category: SourceCategory) {
        match category.or_claude() {
            SourceCategory::Github => self.github += 1,
            SourceCategory::Chatgpt => self.chatgpt += 1,
            SourceCategory::Claude | SourceCategory::Unknown => self.claude += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.github + self.claude + self.chatgpt
    }
}
