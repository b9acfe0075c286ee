//! Structural and minimum-quality checks for submitted dreams.

use serde::Serialize;

use crate::{DreamRecord, MIN_DREAM_ID_LEN, MIN_SUMMARY_LEN};

pub const ISSUE_INVALID_ID: &str = "Invalid dream ID";
pub const ISSUE_ID_SEPARATOR: &str = "Dream ID must not contain ':'";
pub const ISSUE_MISSING_PROJECT_PATH: &str = "Missing project path";
pub const ISSUE_MISSING_PROJECT_NAME: &str = "Missing project name";
pub const ISSUE_MISSING_TIMESTAMP: &str = "Missing timestamp";
pub const ISSUE_MISSING_SUMMARY: &str = "Missing context summary";
pub const ISSUE_SUMMARY_TOO_BRIEF: &str = "Context summary too brief";
pub const ISSUE_INVALID_DURATION: &str = "Invalid duration";

/// Outcome of [`validate_dream`]. Never an error: callers decide how to
/// surface the issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl Validation {
    fn from_issues(issues: Vec<String>) -> Self {
        Self { is_valid: issues.is_empty(), issues }
    }
}

/// Checks required fields and minimum content quality.
///
/// The summary length check only runs when a summary is present, so
/// "missing" and "too brief" never fire together.
#[must_use]
pub fn validate_dream(dream: &DreamRecord) -> Validation {
    let mut issues = Vec::new();

    if dream.id.chars().count() < MIN_DREAM_ID_LEN {
        issues.push(ISSUE_INVALID_ID.to_owned());
    } else if dream.id.contains(':') {
        // ':' separates key segments in the dream namespace
        issues.push(ISSUE_ID_SEPARATOR.to_owned());
    }
    if dream.project_path.is_empty() {
        issues.push(ISSUE_MISSING_PROJECT_PATH.to_owned());
    }
    if dream.project_name.is_empty() {
        issues.push(ISSUE_MISSING_PROJECT_NAME.to_owned());
    }
    if dream.timestamp.is_empty() {
        issues.push(ISSUE_MISSING_TIMESTAMP.to_owned());
    }

    let summary = &dream.context.summary;
    if summary.is_empty() {
        issues.push(ISSUE_MISSING_SUMMARY.to_owned());
    } else if summary.chars().count() < MIN_SUMMARY_LEN {
        issues.push(ISSUE_SUMMARY_TOO_BRIEF.to_owned());
    }

    if dream.metadata.duration.is_some_and(|d| d < 0.0) {
        issues.push(ISSUE_INVALID_DURATION.to_owned());
    }

    Validation::from_issues(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dream() -> DreamRecord {
        let mut dream = DreamRecord {
            id: "dream-0001".to_owned(),
            project_path: "/home/dev/app".to_owned(),
            project_name: "app".to_owned(),
            timestamp: "2025-09-14T12:57:22Z".to_owned(),
            ..DreamRecord::default()
        };
        dream.context.summary = "Implemented the ingestion pipeline".to_owned();
        dream
    }

    #[test]
    fn valid_dream_has_no_issues() {
        let result = validate_dream(&valid_dream());
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn empty_payload_reports_every_required_field() {
        let result = validate_dream(&DreamRecord::default());
        assert!(!result.is_valid);
        assert_eq!(
            result.issues,
            vec![
                ISSUE_INVALID_ID,
                ISSUE_MISSING_PROJECT_PATH,
                ISSUE_MISSING_PROJECT_NAME,
                ISSUE_MISSING_TIMESTAMP,
                ISSUE_MISSING_SUMMARY,
            ]
        );
    }

    #[test]
    fn short_summary_is_too_brief_not_missing() {
        let mut dream = valid_dream();
        dream.context.summary = "0123456789".to_owned();
        let result = validate_dream(&dream);
        assert_eq!(result.issues, vec![ISSUE_SUMMARY_TOO_BRIEF]);
    }

    #[test]
    fn short_id_is_invalid() {
        let mut dream = valid_dream();
        dream.id = "abcd".to_owned();
        assert_eq!(validate_dream(&dream).issues, vec![ISSUE_INVALID_ID]);
    }

    #[test]
    fn id_with_separator_is_rejected() {
        let mut dream = valid_dream();
        dream.id = "dream:123".to_owned();
        assert_eq!(validate_dream(&dream).issues, vec![ISSUE_ID_SEPARATOR]);
    }

    #[test]
    fn negative_duration_is_invalid() {
        let mut dream = valid_dream();
        dream.metadata.duration = Some(-1.0);
        assert_eq!(validate_dream(&dream).issues, vec![ISSUE_INVALID_DURATION]);
    }

    #[test]
    fn zero_duration_is_valid() {
        let mut dream = valid_dream();
        dream.metadata.duration = Some(0.0);
        assert!(validate_dream(&dream).is_valid);
    }
}
