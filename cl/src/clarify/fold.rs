//! Pure text assembly over a session history
//!
//! Everything the state machine hands to a collaborator, and the local
//! fallback when final synthesis fails, is built here from the history alone.
//! Only answered turns contribute.

use super::locale::Locale;
use super::types::{Strategy, Turn};

/// All answers given under `strategy`, joined in round order
///
/// Returns `None` when no turn of that strategy has been answered.
pub fn answers_for(history: &[Turn], strategy: Strategy, locale: Locale) -> Option<String> {
    let answers: Vec<&str> = history
        .iter()
        .filter(|t| t.strategy == strategy)
        .filter_map(|t| t.answer())
        .collect();

    if answers.is_empty() {
        None
    } else {
        Some(answers.join(locale.answer_separator()))
    }
}

/// Composite query the classifier and question generator see after round 1
///
/// Original question first, then need, context and requirements segments in
/// strategy order, each only when something was answered for it.
pub fn fold_current_query(original_query: &str, history: &[Turn], locale: Locale) -> String {
    if history.iter().all(|t| t.answer.is_none()) {
        return original_query.to_string();
    }

    let labels = locale.fold_labels();
    let mut parts = vec![format!("{}{}{}", labels.original, labels.colon, original_query)];

    for strategy in Strategy::ALL {
        if let Some(answers) = answers_for(history, strategy, locale) {
            let label = match strategy {
                Strategy::UnderstandIntent => labels.intent,
                Strategy::GatherContext => labels.context,
                Strategy::SpecifyDetails => labels.details,
            };
            parts.push(format!("{}{}{}", label, labels.colon, answers));
        }
    }

    parts.join(locale.segment_separator())
}

/// Deterministic final query used when the synthesis collaborator fails
///
/// Context comes before intent here, matching how a person would restate
/// the question ("as someone who ..., I want to know ...").
pub fn fallback_final_query(original_query: &str, history: &[Turn], locale: Locale) -> String {
    let format = locale.fallback_format();
    let mut parts = vec![original_query.to_string()];

    let segments = [
        (Strategy::GatherContext, format.context),
        (Strategy::UnderstandIntent, format.intent),
        (Strategy::SpecifyDetails, format.details),
    ];
    for (strategy, (open, close)) in segments {
        if let Some(answers) = answers_for(history, strategy, locale) {
            parts.push(format!("{}{}{}", open, answers, close));
        }
    }

    parts.join(format.separator)
}

/// Hint passed to the question generator alongside the current query
pub fn strategy_hint(reason: &str, strategy: Strategy, locale: Locale) -> String {
    format!(
        "{} | {}: {}",
        reason,
        locale.hint_label(),
        locale.strategy_description(strategy)
    )
}

/// Structured summary the final-query generator rewrites into one question
pub fn conversation_summary(original_query: &str, history: &[Turn], locale: Locale) -> String {
    let labels = locale.summary_labels();
    let mut summary = format!("{}: {}\n\n{}:\n", labels.original, original_query, labels.process);

    for turn in history {
        let Some(answer) = turn.answer() else { continue };
        summary.push_str(&format!(
            "- {}: {}\n  {}: {}\n",
            locale.strategy_description(turn.strategy),
            turn.question,
            labels.answer,
            answer
        ));
    }

    summary
}

/// Human-readable record of a finished conversation
pub fn render_transcript(original_query: &str, history: &[Turn], final_query: &str, locale: Locale) -> String {
    let labels = locale.summary_labels();
    let mut out = format!("{}: {}\n", labels.original, original_query);

    if history.iter().any(|t| t.answer.is_some()) {
        out.push_str(&format!("\n{}:\n", labels.process));
        for turn in history {
            let Some(answer) = turn.answer() else { continue };
            out.push_str(&format!(
                "{} {} ({}): {}\n{}: {}\n\n",
                labels.round,
                turn.round,
                locale.strategy_description(turn.strategy),
                turn.question,
                labels.answer,
                answer
            ));
        }
    } else {
        out.push('\n');
    }

    out.push_str(&format!("{}:\n{}", labels.final_query, final_query));
    out
}
