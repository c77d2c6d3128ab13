//! StrategyPlanner - picks the clarification goal for the next round
//!
//! Pure and deterministic: the same history always yields the same strategy.
//! Context detection is a keyword heuristic over the user's stated intent,
//! best-effort only; it does not understand the answer.

use tracing::debug;

use super::types::{Strategy, Turn};

/// Chooses the next strategy from what has already been asked
#[derive(Debug, Clone)]
pub struct StrategyPlanner {
    /// Lowercased keywords that signal a personalized request
    context_keywords: Vec<String>,
}

impl StrategyPlanner {
    pub fn new<I, S>(context_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let context_keywords = context_keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { context_keywords }
    }

    pub fn context_keywords(&self) -> &[String] {
        &self.context_keywords
    }

    /// Strategy for the question about to be asked
    ///
    /// Intent always comes first; context is gathered at most once and only
    /// when the intent calls for it; everything after is detail.
    pub fn plan(&self, history: &[Turn]) -> Strategy {
        debug!(history_len = history.len(), "plan: called");
        let has = |s: Strategy| history.iter().any(|t| t.strategy == s);

        let strategy = if !has(Strategy::UnderstandIntent) {
            Strategy::UnderstandIntent
        } else if !has(Strategy::GatherContext) && self.needs_context(history) {
            Strategy::GatherContext
        } else {
            Strategy::SpecifyDetails
        };

        debug!(%strategy, "plan: selected");
        strategy
    }

    /// Whether the latest stated intent asks for something personal
    ///
    /// With no answered intent turn yet, context is assumed to be needed.
    pub fn needs_context(&self, history: &[Turn]) -> bool {
        let latest_intent = history
            .iter()
            .rev()
            .filter(|t| t.strategy == Strategy::UnderstandIntent)
            .find_map(|t| t.answer());

        match latest_intent {
            None => {
                debug!("needs_context: no answered intent turn, defaulting to true");
                true
            }
            Some(answer) => {
                let answer = answer.to_lowercase();
                let hit = self.context_keywords.iter().find(|k| answer.contains(k.as_str()));
                debug!(keyword = ?hit, "needs_context: scanned intent answer");
                hit.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clarify::Locale;

    fn planner() -> StrategyPlanner {
        StrategyPlanner::new(Locale::English.default_context_keywords())
    }

    #[test]
    fn test_empty_history_understands_intent() {
        assert_eq!(planner().plan(&[]), Strategy::UnderstandIntent);
    }

    #[test]
    fn test_intent_is_asked_before_anything_else() {
        // Only a details turn so far: intent still missing
        let history = vec![Turn::answered(1, Strategy::SpecifyDetails, "Q", "A")];
        assert_eq!(planner().plan(&history), Strategy::UnderstandIntent);
    }

    #[test]
    fn test_context_follows_personal_intent() {
        let history = vec![Turn::answered(
            1,
            Strategy::UnderstandIntent,
            "What matters most?",
            "I want a Hospital RECOMMENDATION",
        )];
        assert_eq!(planner().plan(&history), Strategy::GatherContext);
    }

    #[test]
    fn test_details_follow_impersonal_intent() {
        let history = vec![Turn::answered(
            1,
            Strategy::UnderstandIntent,
            "What matters most?",
            "just curious about opening hours",
        )];
        assert_eq!(planner().plan(&history), Strategy::SpecifyDetails);
    }

    #[test]
    fn test_context_gathered_at_most_once() {
        let history = vec![
            Turn::answered(1, Strategy::UnderstandIntent, "Q1", "treatment cost"),
            Turn::answered(2, Strategy::GatherContext, "Q2", "diabetic"),
        ];
        assert_eq!(planner().plan(&history), Strategy::SpecifyDetails);
    }

    #[test]
    fn test_needs_context_defaults_true_without_answered_intent() {
        let p = planner();
        assert!(p.needs_context(&[]));
        assert!(p.needs_context(&[Turn::new(1, Strategy::UnderstandIntent, "Q1")]));
    }

    #[test]
    fn test_needs_context_uses_most_recent_intent_answer() {
        let history = vec![
            Turn::answered(1, Strategy::UnderstandIntent, "Q1", "which hospital"),
            Turn::answered(2, Strategy::SpecifyDetails, "Q2", "weekdays"),
            Turn::answered(3, Strategy::UnderstandIntent, "Q3", "actually just parking info"),
        ];
        assert!(!planner().needs_context(&history));
    }

    #[test]
    fn test_custom_keywords_are_normalized() {
        let p = StrategyPlanner::new(["  Budget ", "", "RENT"]);
        assert_eq!(p.context_keywords(), &["budget".to_string(), "rent".to_string()]);

        let history = vec![Turn::answered(1, Strategy::UnderstandIntent, "Q", "my rent is high")];
        assert_eq!(p.plan(&history), Strategy::GatherContext);
    }

    #[test]
    fn test_chinese_keywords_match() {
        let p = StrategyPlanner::new(Locale::Chinese.default_context_keywords());
        let history = vec![Turn::answered(1, Strategy::UnderstandIntent, "问题", "想知道治疗费用")];
        assert_eq!(p.plan(&history), Strategy::GatherContext);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let p = planner();
        let history = vec![
            Turn::answered(1, Strategy::UnderstandIntent, "Q1", "medication choice"),
            Turn::new(2, Strategy::GatherContext, "Q2"),
        ];
        let first = p.plan(&history);
        for _ in 0..10 {
            assert_eq!(p.plan(&history), first);
        }
    }
}
