//! Dream schema: the stored snapshot of a development session and the
//! per-project summary derived from it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DreamError;

/// Schema version stamped on every record written by this server.
pub const DREAM_SCHEMA_VERSION: &str = "2.0";

/// One snapshot of a development session.
///
/// Every field is decoded leniently (`#[serde(default)]`) so that a payload
/// with missing fields still decodes and the validator can report all of
/// them at once. Empty strings are treated as missing, the same way the
/// validator does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub context: DreamContext,
    #[serde(default)]
    pub conversation: Conversation,
    #[serde(default)]
    pub metadata: DreamMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamContext {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub current_tasks: Vec<String>,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    pub file_structure: Vec<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub key_decisions: Vec<String>,
    /// `None` when the source did not track blockers at all; an empty list
    /// means "tracked, none found" and scores differently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockers: Option<Vec<String>>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_moments: Vec<KeyMoment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_history: Vec<CommandRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_changes: Vec<CodeChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    #[serde(default)]
    pub successful: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeChange {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Session length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_git_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Returns the string if it is present and non-empty.
#[must_use]
pub fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Generates a server-side dream id: `dream_<unix millis>_<random suffix>`.
#[must_use]
pub fn generate_dream_id(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("dream_{}_{}", now.timestamp_millis(), &suffix[..9])
}

/// Parses an ISO-8601 timestamp, accepting both RFC 3339 and naive UTC forms.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl DreamRecord {
    /// Decodes a JSON payload into the explicit schema.
    ///
    /// # Errors
    /// Returns [`DreamError::Malformed`] when a field has the wrong type.
    pub fn decode(value: serde_json::Value) -> Result<Self, DreamError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decodes a stored JSON document.
    ///
    /// # Errors
    /// Returns [`DreamError::Malformed`] when the document is not a dream.
    pub fn from_json_str(raw: &str) -> Result<Self, DreamError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn commit_hash(&self) -> Option<&str> {
        non_empty(self.metadata.commit_hash.as_ref())
    }

    #[must_use]
    pub fn claude_version(&self) -> Option<&str> {
        non_empty(self.metadata.claude_version.as_ref())
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        non_empty(self.metadata.source.as_ref())
    }

    #[must_use]
    pub fn last_commit(&self) -> Option<&str> {
        non_empty(self.context.last_commit.as_ref())
    }

    #[must_use]
    pub fn custom_notes(&self) -> Option<&str> {
        non_empty(self.context.custom_notes.as_ref())
    }

    #[must_use]
    pub fn project_type(&self) -> &str {
        non_empty(self.metadata.project_type.as_ref()).unwrap_or("unknown")
    }

    /// Development hours recorded for this dream (zero when absent).
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.metadata.duration_hours.filter(|h| h.is_finite() && *h > 0.0).unwrap_or(0.0)
    }

    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Fills the server-computed metadata: derived `durationHours`, the
    /// quality score, the serialized size and the schema version.
    ///
    /// Caller-supplied `qualityScore` and `size` are discarded.
    #[must_use]
    pub fn with_computed_metadata(mut self) -> Self {
        if self.metadata.duration_hours.is_none() {
            self.metadata.duration_hours =
                self.metadata.duration.filter(|d| *d > 0.0).map(|d| d / 3600.0);
        }
        self.metadata.quality_score = None;
        self.metadata.size = None;
        let size = serde_json::to_string(&self).map(|s| s.len() as u64).ok();
        self.metadata.quality_score = Some(crate::quality_score(&self));
        self.metadata.size = size;
        self.metadata.version = Some(DREAM_SCHEMA_VERSION.to_owned());
        self
    }
}

/// Denormalized per-project view of the latest dream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub last_dream: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub dream_count: usize,
    #[serde(default)]
    pub total_dev_hours: f64,
}

impl ProjectSummary {
    #[must_use]
    pub fn from_dream(dream: &DreamRecord, dream_count: usize, total_dev_hours: f64) -> Self {
        Self {
            path: dream.project_path.clone(),
            last_dream: dream.id.clone(),
            last_updated: dream.timestamp.clone(),
            project_name: dream.project_name.clone(),
            tech_stack: dream.context.tech_stack.clone(),
            dream_count,
            total_dev_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_accepts_camel_case_payload() {
        let dream = DreamRecord::decode(json!({
            "id": "20250914_085722",
            "projectPath": "/p",
            "projectName": "p",
            "timestamp": "2025-09-14T12:57:22Z",
            "context": {"summary": "Working on the ingestion path", "techStack": ["Rust"]},
            "conversation": {"keyDecisions": ["use axum"], "blockers": []},
            "metadata": {"commitHash": "abc123", "duration": 120}
        }))
        .expect("decode");
        assert_eq!(dream.project_path, "/p");
        assert_eq!(dream.context.tech_stack, vec!["Rust".to_owned()]);
        assert_eq!(dream.conversation.blockers, Some(vec![]));
        assert_eq!(dream.commit_hash(), Some("abc123"));
    }

    #[test]
    fn decode_missing_fields_defaults() {
        let dream = DreamRecord::decode(json!({})).expect("decode");
        assert!(dream.id.is_empty());
        assert!(dream.conversation.blockers.is_none());
        assert!(dream.metadata.duration.is_none());
    }

    #[test]
    fn decode_rejects_wrong_types() {
        let err = DreamRecord::decode(json!({"context": {"summary": 42}})).unwrap_err();
        assert!(err.to_string().starts_with("Malformed dream payload"));
    }

    #[test]
    fn empty_commit_hash_counts_as_missing() {
        let mut dream = DreamRecord::default();
        dream.metadata.commit_hash = Some(String::new());
        assert!(dream.commit_hash().is_none());
    }

    #[test]
    fn computed_metadata_overrides_client_values() {
        let mut dream = DreamRecord::default();
        dream.metadata.quality_score = Some(99);
        dream.metadata.size = Some(1);
        dream.metadata.duration = Some(7200.0);
        let dream = dream.with_computed_metadata();
        assert_eq!(dream.metadata.quality_score, Some(10));
        assert!(dream.metadata.size.unwrap_or(0) > 1);
        assert_eq!(dream.metadata.duration_hours, Some(2.0));
        assert_eq!(dream.metadata.version.as_deref(), Some(DREAM_SCHEMA_VERSION));
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let now = Utc::now();
        let a = generate_dream_id(now);
        let b = generate_dream_id(now);
        assert!(a.starts_with("dream_"));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_timestamp_variants() {
        assert!(parse_timestamp("2025-09-14T12:57:22Z").is_some());
        assert!(parse_timestamp("2025-09-14T12:57:22.123+02:00").is_some());
        assert!(parse_timestamp("2025-09-14T12:57:22").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
