//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Classification prompt (SIMPLE / COMPLEX / VAGUE)
pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");

/// Follow-up question prompt
pub const QUESTION: &str = include_str!("../../prompts/question.pmt");

/// Final question synthesis prompt
pub const FINAL: &str = include_str!("../../prompts/final.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "classify" => Some(CLASSIFY),
        "question" => Some(QUESTION),
        "final" => Some(FINAL),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prompt_lists_all_labels() {
        let prompt = get_embedded("classify").unwrap();
        assert!(prompt.contains("SIMPLE"));
        assert!(prompt.contains("COMPLEX"));
        assert!(prompt.contains("VAGUE"));
        assert!(prompt.contains("{{query}}"));
    }

    #[test]
    fn test_question_and_final_prompts_have_placeholders() {
        let question = get_embedded("question").unwrap();
        assert!(question.contains("{{query}}"));
        assert!(question.contains("{{hint}}"));
        assert!(get_embedded("final").unwrap().contains("{{summary}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("plan").is_none());
    }
}
