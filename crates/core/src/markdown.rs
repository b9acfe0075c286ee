//! Markdown rendering of a dream for context restoration.

use std::fmt::Write as _;

use crate::DreamRecord;

fn push_list(out: &mut String, items: &[String], marker: &str) {
    for item in items {
        let _ = writeln!(out, "{marker}{item}");
    }
}

/// Renders the latest dream of a project as a Markdown briefing: header,
/// summary, tech stack, task checklists, decisions, blockers, next steps,
/// file tree and optional notes.
#[must_use]
pub fn render_dream_summary(dream: &DreamRecord) -> String {
    let context = &dream.context;
    let conversation = &dream.conversation;
    let mut out = String::new();

    out.push_str("# 🌙 Dream Context Restoration\n\n");
    let _ = writeln!(out, "## Project: {}", dream.project_name);
    let _ = writeln!(out, "**Path:** {}", dream.project_path);
    let _ = writeln!(out, "**Last Dream:** {}\n", dream.timestamp);

    let _ = writeln!(out, "## Summary\n{}\n", context.summary);

    out.push_str("## Tech Stack\n");
    push_list(&mut out, &context.tech_stack, "- ");
    out.push('\n');

    out.push_str("## Current Tasks\n");
    push_list(&mut out, &context.current_tasks, "- [ ] ");
    out.push('\n');

    out.push_str("## Completed Tasks\n");
    push_list(&mut out, &context.completed_tasks, "- [x] ");
    out.push('\n');

    out.push_str("## Key Decisions\n");
    push_list(&mut out, &conversation.key_decisions, "- ");
    out.push('\n');

    out.push_str("## Known Blockers\n");
    push_list(&mut out, conversation.blockers.as_deref().unwrap_or_default(), "- ⚠️ ");
    out.push('\n');

    out.push_str("## Next Steps\n");
    push_list(&mut out, &conversation.next_steps, "1. ");
    out.push('\n');

    out.push_str("## File Structure\n```\n");
    push_list(&mut out, &context.file_structure, "");
    out.push_str("```\n");

    if let Some(notes) = dream.custom_notes() {
        let _ = write!(out, "\n## Additional Notes\n{notes}\n");
    }

    out
}
