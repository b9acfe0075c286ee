//! Completeness score of a dream, 0–100.

use crate::DreamRecord;

const SUMMARY_DETAILED_LEN: usize = 50;
const CUSTOM_NOTES_MIN_LEN: usize = 10;
const MAX_QUALITY_SCORE: u32 = 100;

/// Weighted, additive completeness score clamped to 100.
///
/// Context completeness weighs 40, conversation depth 30 and metadata
/// richness 30. Git-originated dreams (with a commit hash) carry verifiable
/// provenance and are weighted higher.
#[must_use]
pub fn quality_score(dream: &DreamRecord) -> u8 {
    let context = &dream.context;
    let conversation = &dream.conversation;
    let metadata = &dream.metadata;

    let mut score: u32 = 0;

    if context.summary.chars().count() > SUMMARY_DETAILED_LEN {
        score += 15;
    }
    if !context.tech_stack.is_empty() {
        score += 10;
    }
    if !context.current_tasks.is_empty() {
        score += 8;
    }
    if !context.file_structure.is_empty() {
        score += 7;
    }

    if !conversation.key_decisions.is_empty() {
        score += 15;
    }
    if !conversation.next_steps.is_empty() {
        score += 10;
    }
    if conversation.blockers.is_some() {
        score += 5;
    }

    if metadata.duration.is_some_and(|d| d > 0.0) {
        score += 10;
    }
    if dream.claude_version().is_some() || dream.source().is_some() {
        score += 5;
    }
    if dream.commit_hash().is_some() {
        score += 10;
    }
    if dream.custom_notes().is_some_and(|n| n.chars().count() > CUSTOM_NOTES_MIN_LEN) {
        score += 5;
    }

    u8::try_from(score.min(MAX_QUALITY_SCORE)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_dream() -> DreamRecord {
        let mut dream = DreamRecord {
            id: "dream-0001".to_owned(),
            project_path: "/p".to_owned(),
            project_name: "p".to_owned(),
            timestamp: "2025-09-14T12:57:22Z".to_owned(),
            ..DreamRecord::default()
        };
        dream.context.summary = "A short but valid summary".to_owned();
        dream
    }

    fn full_dream() -> DreamRecord {
        let mut dream = bare_dream();
        dream.context.summary = "x".repeat(60);
        dream.context.tech_stack = vec!["Rust".to_owned()];
        dream.context.current_tasks = vec!["ship".to_owned()];
        dream.context.file_structure = vec!["src/".to_owned()];
        dream.context.custom_notes = Some("notes that are long enough".to_owned());
        dream.conversation.key_decisions = vec!["use sqlite".to_owned()];
        dream.conversation.next_steps = vec!["deploy".to_owned()];
        dream.conversation.blockers = Some(vec![]);
        dream.metadata.duration = Some(120.0);
        dream.metadata.claude_version = Some("claude-3".to_owned());
        dream.metadata.commit_hash = Some("abc123".to_owned());
        dream
    }

    #[test]
    fn bare_dream_scores_zero() {
        assert_eq!(quality_score(&bare_dream()), 0);
    }

    #[test]
    fn git_dream_example_scores_sixty() {
        let mut dream = bare_dream();
        dream.context.summary = "s".repeat(60);
        dream.context.tech_stack = vec!["Rust".to_owned()];
        dream.conversation.key_decisions = vec!["keep the clamp".to_owned()];
        dream.metadata.duration = Some(120.0);
        dream.metadata.commit_hash = Some("abc123".to_owned());
        assert_eq!(quality_score(&dream), 60);
    }

    #[test]
    fn every_criterion_met_scores_exactly_hundred() {
        assert_eq!(quality_score(&full_dream()), 100);
    }

    #[test]
    fn empty_blockers_list_still_counts() {
        let mut dream = bare_dream();
        dream.conversation.blockers = Some(vec![]);
        assert_eq!(quality_score(&dream), 5);
    }

    #[test]
    fn source_tag_counts_like_claude_version() {
        let mut dream = bare_dream();
        dream.metadata.source = Some("chatgpt".to_owned());
        assert_eq!(quality_score(&dream), 5);
    }

    #[test]
    fn boundary_lengths_do_not_score() {
        let mut dream = bare_dream();
        dream.context.summary = "y".repeat(50);
        dream.context.custom_notes = Some("0123456789".to_owned());
        dream.metadata.duration = Some(0.0);
        assert_eq!(quality_score(&dream), 0);
    }

    #[test]
    fn adding_any_single_field_never_decreases_score() {
        let base = quality_score(&bare_dream());
        let full = full_dream();
        let additions: Vec<Box<dyn Fn(&mut DreamRecord) + '_>> = vec![
            Box::new(|d| d.context.summary.clone_from(&full.context.summary)),
            Box::new(|d| d.context.tech_stack.clone_from(&full.context.tech_stack)),
            Box::new(|d| d.context.current_tasks.clone_from(&full.context.current_tasks)),
            Box::new(|d| d.context.file_structure.clone_from(&full.context.file_structure)),
            Box::new(|d| d.context.custom_notes.clone_from(&full.context.custom_notes)),
            Box::new(|d| d.conversation.key_decisions.clone_from(&full.conversation.key_decisions)),
            Box::new(|d| d.conversation.next_steps.clone_from(&full.conversation.next_steps)),
            Box::new(|d| d.conversation.blockers.clone_from(&full.conversation.blockers)),
            Box::new(|d| d.metadata.duration = full.metadata.duration),
            Box::new(|d| d.metadata.claude_version.clone_from(&full.metadata.claude_version)),
            Box::new(|d| d.metadata.commit_hash.clone_from(&full.metadata.commit_hash)),
        ];
        for add in &additions {
            let mut dream = bare_dream();
            add(&mut dream);
            let score = quality_score(&dream);
            assert!(score > base, "adding a qualifying field must raise the score");
            assert!(score <= 100);
        }
    }
}
