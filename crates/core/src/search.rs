//! Naive keyword relevance over dream text fields.
//!
//! Matching is substring-based: the query word "api" also matches inside
//! "rapid". Scores are occurrence counts multiplied by field weights.

use std::sync::LazyLock;

use regex::Regex;

use crate::{DreamRecord, SNIPPET_MAX_CHARS};

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Snippets are only taken from fields longer than this.
const SNIPPET_SOURCE_MIN_LEN: usize = 20;

/// Text areas of a dream that participate in search, with their weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Summary,
    Notes,
    Decisions,
    Moments,
    Tasks,
}

impl SearchField {
    pub const ALL: [Self; 5] =
        [Self::Summary, Self::Notes, Self::Decisions, Self::Moments, Self::Tasks];

    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Summary => 3,
            Self::Notes | Self::Decisions | Self::Moments => 2,
            Self::Tasks => 1,
        }
    }

    #[must_use]
    pub fn text(self, dream: &DreamRecord) -> String {
        match self {
            Self::Summary => dream.context.summary.clone(),
            Self::Notes => dream.context.custom_notes.clone().unwrap_or_default(),
            Self::Decisions => dream.conversation.key_decisions.join(" "),
            Self::Moments => dream
                .conversation
                .key_moments
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Tasks => dream.context.current_tasks.join(" "),
        }
    }
}

/// A parsed search query: lowercase words with their matchers.
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    words: Vec<(String, Regex)>,
}

/// Relevance of one dream for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub score: u32,
    pub snippet: Option<String>,
}

impl KeywordQuery {
    /// Splits the query into lowercase words. Returns `None` when the query
    /// has no words.
    #[must_use]
    pub fn parse(query: &str) -> Option<Self> {
        let words: Vec<(String, Regex)> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter_map(|word| {
                let matcher = Regex::new(&regex::escape(&word)).ok()?;
                Some((word, matcher))
            })
            .collect();
        if words.is_empty() { None } else { Some(Self { words }) }
    }

    #[must_use]
    pub fn words(&self) -> Vec<&str> {
        self.words.iter().map(|(w, _)| w.as_str()).collect()
    }

    /// Scores a dream. The snippet comes from the first field (in weight
    /// order) and query word that matched, provided the field is long enough.
    #[must_use]
    pub fn score(&self, dream: &DreamRecord) -> KeywordMatch {
        let mut score: u32 = 0;
        let mut snippet = None;

        for field in SearchField::ALL {
            let content = field.text(dream);
            if content.is_empty() {
                continue;
            }
            let lower = content.to_lowercase();
            for (word, matcher) in &self.words {
                let matches = u32::try_from(matcher.find_iter(&lower).count()).unwrap_or(u32::MAX);
                if matches == 0 {
                    continue;
                }
                score = score.saturating_add(matches.saturating_mul(field.weight()));
                if snippet.is_none() && content.len() > SNIPPET_SOURCE_MIN_LEN {
                    snippet = Some(extract_snippet(&content, word));
                }
            }
        }

        KeywordMatch { score, snippet }
    }
}

/// Returns the first sentence containing `word` (case-insensitive),
/// truncated to the snippet length, or the head of the content.
#[must_use]
pub fn extract_snippet(content: &str, word: &str) -> String {
    let needle = word.to_lowercase();
    for sentence in SENTENCE_SPLIT.split(content) {
        if sentence.to_lowercase().contains(&needle) {
            return truncate_with_ellipsis(sentence.trim(), sentence.chars().count());
        }
    }
    truncate_with_ellipsis(content, content.chars().count())
}

/// First `SNIPPET_MAX_CHARS` characters of `text`, with "..." appended when
/// `original_len` exceeds the limit.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, original_len: usize) -> String {
    let mut out: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
    if original_len > SNIPPET_MAX_CHARS {
        out.push_str("...");
    }
    out
}

/// First `max` characters of `text`.
#[must_use]
pub fn take_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
