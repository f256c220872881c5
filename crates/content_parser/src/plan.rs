use std::sync::OnceLock;

use regex::Regex;

/// Phrase that marks a message as carrying an implementation plan.
pub const PLAN_MARKER: &str = "implementation plan";

/// Fallback fragments must be longer than this many characters.
const MIN_FRAGMENT_CHARS: usize = 10;

/// One extracted plan step.
///
/// `completed` reflects the historical message content, not live task status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub index: usize,
    pub text: String,
    pub completed: bool,
}

fn sentence_break_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"\.\s+").expect("sentence regex must compile"))
}

pub(crate) fn has_plan_marker(content: &str) -> bool {
    content.to_lowercase().contains(PLAN_MARKER)
}

/// Extracts steps from fence-free prose: bullets first, sentences otherwise.
pub(crate) fn extract_steps(prose: &str) -> Vec<PlanStep> {
    let bullets = bullet_items(prose);
    let texts = if bullets.is_empty() {
        sentence_fragments(prose)
    } else {
        bullets
    };

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| PlanStep {
            index,
            text,
            completed: true,
        })
        .collect()
}

/// Text of a `- item` line, `None` for anything else.
pub(crate) fn bullet_text(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('-')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn bullet_items(prose: &str) -> Vec<String> {
    prose
        .lines()
        .filter_map(bullet_text)
        .map(str::to_string)
        .collect()
}

fn sentence_fragments(prose: &str) -> Vec<String> {
    sentence_break_regex()
        .split(prose)
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_FRAGMENT_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_steps, has_plan_marker};

    fn texts(prose: &str) -> Vec<String> {
        extract_steps(prose)
            .into_iter()
            .map(|step| step.text)
            .collect()
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        assert!(has_plan_marker("Here is my IMPLEMENTATION PLAN:"));
        assert!(!has_plan_marker("Here is my plan:"));
    }

    #[test]
    fn bullets_are_extracted_in_order() {
        let prose = "Implementation Plan\n- step one\n  - nested step\n-not a bullet\n---\n- step two";
        assert_eq!(texts(prose), vec!["step one", "nested step", "step two"]);
    }

    #[test]
    fn empty_bullets_are_skipped() {
        assert_eq!(texts("- \n- real"), vec!["real"]);
    }

    #[test]
    fn sentence_fallback_keeps_long_fragments() {
        let prose = "Implementation plan follows. Ok. Build the parser first. Then wire the store.";
        assert_eq!(
            texts(prose),
            vec![
                "Implementation plan follows",
                "Build the parser first",
                "Then wire the store.",
            ]
        );
    }

    #[test]
    fn every_step_is_marked_completed_with_sequential_index() {
        let steps = extract_steps("- a step\n- another");
        assert!(steps.iter().all(|step| step.completed));
        assert_eq!(
            steps.iter().map(|step| step.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}
