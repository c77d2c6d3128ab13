//! SessionStateMachine - the per-round control loop
//!
//! Each round classifies the current query, then either closes the session
//! with a synthesized final question or plans a strategy and asks one
//! follow-up. Collaborator calls within a round are awaited one after the
//! other; the caller is responsible for never running two rounds of the same
//! session concurrently (the store's per-session lock does this).

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{ClarifyError, ClarifyResult, Stage};
use super::fold::{fold_current_query, strategy_hint};
use super::locale::Locale;
use super::strategy::StrategyPlanner;
use super::synthesis::synthesize;
use super::types::{Label, Session, Turn};
use crate::collaborator::{Classifier, FinalQueryGenerator, QuestionGenerator};

/// What a round produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A follow-up question is waiting for the user; the session stays open
    WaitingAnswer { question: String, round: u32 },
    /// The session is closed with its final question
    Completed {
        final_query: String,
        round: u32,
        /// Final question came from the local fallback
        degraded: bool,
    },
}

impl RoundOutcome {
    pub fn round(&self) -> u32 {
        match self {
            Self::WaitingAnswer { round, .. } | Self::Completed { round, .. } => *round,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// The three external services a round consults
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub questions: Arc<dyn QuestionGenerator>,
    pub finals: Arc<dyn FinalQueryGenerator>,
}

impl Collaborators {
    /// Use one value for all three roles
    pub fn shared<T>(collaborator: Arc<T>) -> Self
    where
        T: Classifier + QuestionGenerator + FinalQueryGenerator + 'static,
    {
        Self {
            classifier: collaborator.clone(),
            questions: collaborator.clone(),
            finals: collaborator,
        }
    }
}

/// Drives sessions through their rounds
pub struct SessionStateMachine {
    collaborators: Collaborators,
    planner: StrategyPlanner,
    locale: Locale,
}

impl SessionStateMachine {
    pub fn new(collaborators: Collaborators, planner: StrategyPlanner, locale: Locale) -> Self {
        Self {
            collaborators,
            planner,
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Run round 1 against the original query of a fresh session
    pub async fn start(&self, session: &mut Session) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %session.id(), "start: called");
        ensure_active(session)?;
        if session.round() != 0 {
            return Err(ClarifyError::InvalidInput(format!(
                "session {} has already started",
                session.id()
            )));
        }
        let query = session.original_query().to_string();
        self.advance(session, &query).await
    }

    /// Record the answer to the outstanding question and run the next round
    pub async fn continue_with(&self, session: &mut Session, answer: &str) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %session.id(), round = session.round(), "continue_with: called");
        ensure_active(session)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ClarifyError::InvalidInput("answer must not be empty".to_string()));
        }

        if !session.record_answer(answer) {
            debug!(session_id = %session.id(), "continue_with: no outstanding question to answer");
        }

        let current_query = fold_current_query(session.original_query(), session.history(), self.locale);
        debug!(%current_query, "continue_with: folded current query");
        self.advance(session, &current_query).await
    }

    /// Close the session now, without a further answer
    ///
    /// The outstanding question, if any, stays unanswered and does not reach
    /// the final question. The round counter is not advanced.
    pub async fn finish(&self, session: &mut Session) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %session.id(), round = session.round(), "finish: called");
        ensure_active(session)?;
        Ok(self.complete(session, session.round()).await)
    }

    /// One classify -> (ask | finish) cycle
    async fn advance(&self, session: &mut Session, current_query: &str) -> ClarifyResult<RoundOutcome> {
        let round = session.round() + 1;
        debug!(session_id = %session.id(), round, max_rounds = session.max_rounds(), "advance: called");

        let classification = match self.collaborators.classifier.classify(current_query).await {
            Ok(c) => c,
            Err(source) => {
                warn!(session_id = %session.id(), round, error = %source, "advance: classification failed");
                session.fail_at(round);
                return Err(ClarifyError::Collaborator {
                    stage: Stage::Classify,
                    source,
                });
            }
        };
        info!(session_id = %session.id(), round, label = %classification.label, reason = %classification.reason, "advance: classified");

        if classification.label == Label::Simple || round >= session.max_rounds() {
            if classification.label == Label::Simple {
                info!(session_id = %session.id(), round, "advance: query is clear, finishing");
            } else {
                info!(session_id = %session.id(), round, "advance: max rounds reached, finishing");
            }
            return Ok(self.complete(session, round).await);
        }

        let strategy = self.planner.plan(session.history());
        let hint = strategy_hint(&classification.reason, strategy, self.locale);

        let question = match self
            .collaborators
            .questions
            .generate_question(current_query, &hint)
            .await
        {
            Ok(q) => q,
            Err(source) => {
                warn!(session_id = %session.id(), round, error = %source, "advance: question generation failed");
                session.fail_at(round);
                return Err(ClarifyError::Collaborator {
                    stage: Stage::GenerateQuestion,
                    source,
                });
            }
        };

        info!(session_id = %session.id(), round, %strategy, %question, "advance: asking follow-up");
        session.push_turn(Turn::new(round, strategy, question.clone()));
        Ok(RoundOutcome::WaitingAnswer { question, round })
    }

    async fn complete(&self, session: &mut Session, round: u32) -> RoundOutcome {
        let synthesis = synthesize(
            self.collaborators.finals.as_ref(),
            session.original_query(),
            session.history(),
            self.locale,
        )
        .await;
        session.complete_at(round);

        info!(
            session_id = %session.id(),
            round = session.round(),
            degraded = synthesis.degraded,
            final_query = %synthesis.final_query,
            "complete: session completed"
        );
        RoundOutcome::Completed {
            final_query: synthesis.final_query,
            round: session.round(),
            degraded: synthesis.degraded,
        }
    }
}

fn ensure_active(session: &Session) -> ClarifyResult<()> {
    if session.is_active() {
        Ok(())
    } else {
        Err(ClarifyError::SessionClosed {
            id: session.id().to_string(),
            status: session.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clarify::{SessionStatus, Strategy};
    use crate::collaborator::mock::ScriptedCollaborator;

    const ORIGINAL: &str = "What hospital should I go to in Hong Kong?";

    fn machine(script: ScriptedCollaborator) -> (SessionStateMachine, Arc<ScriptedCollaborator>) {
        let script = Arc::new(script);
        let machine = SessionStateMachine::new(
            Collaborators::shared(script.clone()),
            StrategyPlanner::new(Locale::English.default_context_keywords()),
            Locale::English,
        );
        (machine, script)
    }

    #[tokio::test]
    async fn test_simple_first_round_returns_original() {
        let (machine, script) = machine(ScriptedCollaborator::new().label(Label::Simple));
        let mut session = Session::new("s1", ORIGINAL, 5);

        let outcome = machine.start(&mut session).await.unwrap();

        assert_eq!(
            outcome,
            RoundOutcome::Completed {
                final_query: ORIGINAL.to_string(),
                round: 1,
                degraded: false
            }
        );
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.round(), 1);
        assert!(script.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vague_then_simple_scenario() {
        let (machine, script) = machine(
            ScriptedCollaborator::new()
                .label(Label::Vague)
                .question("What matters most to you in a hospital?")
                .label(Label::Simple)
                .final_query("As a diabetic who cares about cost, which Hong Kong hospital should I choose?"),
        );
        let mut session = Session::new("s1", ORIGINAL, 5);

        let first = machine.start(&mut session).await.unwrap();
        assert_eq!(
            first,
            RoundOutcome::WaitingAnswer {
                question: "What matters most to you in a hospital?".to_string(),
                round: 1
            }
        );
        assert_eq!(session.round(), session.history().len() as u32);
        assert_eq!(session.history()[0].strategy, Strategy::UnderstandIntent);

        let second = machine
            .continue_with(&mut session, "I have diabetes and care about cost")
            .await
            .unwrap();
        match second {
            RoundOutcome::Completed {
                final_query,
                round,
                degraded,
            } => {
                assert!(!final_query.is_empty());
                assert_eq!(round, 2);
                assert!(!degraded);
            }
            other => panic!("expected completion, got {:?}", other),
        }

        // Round 2 classified the folded query, not the raw original
        let classified = script.classified.lock().unwrap();
        assert_eq!(classified[0], ORIGINAL);
        assert!(classified[1].starts_with("Original question: "));
        assert!(classified[1].contains("Underlying need: I have diabetes and care about cost"));
    }

    #[tokio::test]
    async fn test_max_rounds_forces_completion() {
        let (machine, _) = machine(
            ScriptedCollaborator::new()
                .label(Label::Vague)
                .question("Q1")
                .label(Label::Complex)
                .question("Q2")
                .label(Label::Vague)
                .final_query("Final"),
        );
        let mut session = Session::new("s1", ORIGINAL, 3);

        assert!(!machine.start(&mut session).await.unwrap().is_completed());
        assert!(!machine.continue_with(&mut session, "hospital choice").await.unwrap().is_completed());
        let last = machine.continue_with(&mut session, "diabetic").await.unwrap();

        assert!(last.is_completed());
        assert_eq!(last.round(), 3);
        assert_eq!(session.round(), 3);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_strategies_progress_across_rounds() {
        let (machine, script) = machine(
            ScriptedCollaborator::new()
                .label(Label::Vague)
                .question("What do you want?")
                .label(Label::Complex)
                .question("Tell me about you?")
                .label(Label::Complex)
                .question("Any details?"),
        );
        let mut session = Session::new("s1", ORIGINAL, 5);

        machine.start(&mut session).await.unwrap();
        machine.continue_with(&mut session, "a treatment recommendation").await.unwrap();
        machine.continue_with(&mut session, "I am 60").await.unwrap();

        let strategies: Vec<Strategy> = session.history().iter().map(|t| t.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                Strategy::UnderstandIntent,
                Strategy::GatherContext,
                Strategy::SpecifyDetails
            ]
        );

        let hints = script.hints.lock().unwrap();
        assert!(hints[1].contains("Currently needed: gather the user's background"));
    }

    #[tokio::test]
    async fn test_classification_failure_marks_error() {
        let (machine, _) = machine(ScriptedCollaborator::new().classify_error());
        let mut session = Session::new("s1", ORIGINAL, 5);

        let err = machine.start(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            ClarifyError::Collaborator {
                stage: Stage::Classify,
                ..
            }
        ));
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.round(), 1);
    }

    #[tokio::test]
    async fn test_question_failure_marks_error() {
        let (machine, _) = machine(ScriptedCollaborator::new().label(Label::Vague).question_error());
        let mut session = Session::new("s1", ORIGINAL, 5);

        let err = machine.start(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            ClarifyError::Collaborator {
                stage: Stage::GenerateQuestion,
                ..
            }
        ));
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.round(), 1);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_final_failure_still_completes() {
        let (machine, _) = machine(
            ScriptedCollaborator::new()
                .label(Label::Vague)
                .question("Your situation?")
                .label(Label::Simple)
                .final_error(),
        );
        let mut session = Session::new("s1", ORIGINAL, 5);

        machine.start(&mut session).await.unwrap();
        let outcome = machine.continue_with(&mut session, "retired nurse").await.unwrap();

        match outcome {
            RoundOutcome::Completed {
                final_query, degraded, ..
            } => {
                assert!(degraded);
                assert!(final_query.contains(ORIGINAL));
                assert!(final_query.contains("[Intent: retired nurse]"));
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_continue_on_completed_session_is_closed() {
        let (machine, _) = machine(ScriptedCollaborator::new().label(Label::Simple));
        let mut session = Session::new("s1", ORIGINAL, 5);
        machine.start(&mut session).await.unwrap();

        let err = machine.continue_with(&mut session, "more").await.unwrap_err();
        assert!(matches!(
            err,
            ClarifyError::SessionClosed {
                status: SessionStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_answer_rejected_without_mutation() {
        let (machine, _) = machine(ScriptedCollaborator::new().label(Label::Vague).question("Q1"));
        let mut session = Session::new("s1", ORIGINAL, 5);
        machine.start(&mut session).await.unwrap();

        let err = machine.continue_with(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, ClarifyError::InvalidInput(_)));
        assert_eq!(session.round(), 1);
        assert_eq!(session.pending_question(), Some("Q1"));
    }

    #[tokio::test]
    async fn test_finish_uses_answered_turns_only() {
        let (machine, script) = machine(
            ScriptedCollaborator::new()
                .label(Label::Vague)
                .question("Q1")
                .label(Label::Vague)
                .question("Q2")
                .final_query("Synthesized"),
        );
        let mut session = Session::new("s1", ORIGINAL, 5);
        machine.start(&mut session).await.unwrap();
        machine.continue_with(&mut session, "cost of treatment").await.unwrap();

        let outcome = machine.finish(&mut session).await.unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::Completed {
                final_query: "Synthesized".to_string(),
                round: 2,
                degraded: false
            }
        );
        assert!(!script.summaries.lock().unwrap()[0].contains("Q2"));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (machine, _) = machine(ScriptedCollaborator::new().label(Label::Vague).question("Q1"));
        let mut session = Session::new("s1", ORIGINAL, 5);
        machine.start(&mut session).await.unwrap();

        assert!(matches!(
            machine.start(&mut session).await,
            Err(ClarifyError::InvalidInput(_))
        ));
    }
}
