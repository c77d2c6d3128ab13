//! Final query synthesis
//!
//! The one collaborator failure the core recovers from: if the model cannot
//! produce the final question, a deterministic assembly of the answers is
//! returned instead and the result is flagged as degraded.

use tracing::{debug, warn};

use super::fold::{conversation_summary, fallback_final_query};
use super::locale::Locale;
use super::types::Turn;
use crate::collaborator::FinalQueryGenerator;

/// Outcome of final query synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub final_query: String,
    /// True when the local fallback replaced the collaborator's output
    pub degraded: bool,
}

/// Turn the original question plus answered history into one question
///
/// With nothing answered the original query is returned untouched and no
/// collaborator call is made.
pub async fn synthesize(
    generator: &dyn FinalQueryGenerator,
    original_query: &str,
    history: &[Turn],
    locale: Locale,
) -> Synthesis {
    if history.iter().all(|t| t.answer.is_none()) {
        debug!("synthesize: no answered turns, returning original query");
        return Synthesis {
            final_query: original_query.to_string(),
            degraded: false,
        };
    }

    let summary = conversation_summary(original_query, history, locale);
    debug!(summary_len = summary.len(), "synthesize: calling final query generator");

    match generator.synthesize_final(&summary).await {
        Ok(text) if !text.trim().is_empty() => Synthesis {
            final_query: text.trim().to_string(),
            degraded: false,
        },
        Ok(_) => {
            warn!("synthesize: generator returned empty text, using fallback assembly");
            fallback(original_query, history, locale)
        }
        Err(e) => {
            warn!(error = %e, "synthesize: generator failed, using fallback assembly");
            fallback(original_query, history, locale)
        }
    }
}

fn fallback(original_query: &str, history: &[Turn], locale: Locale) -> Synthesis {
    Synthesis {
        final_query: fallback_final_query(original_query, history, locale),
        degraded: true,
    }
}
