//! Clarification domain types
//!
//! A `Session` is one clarification conversation. Its fields are private so
//! the history/round invariants can only be changed through the methods here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clarification goal of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Work out what the user actually wants to know
    UnderstandIntent,
    /// Collect the user's personal circumstances
    GatherContext,
    /// Pin down remaining specifics
    SpecifyDetails,
}

impl Strategy {
    /// Order in which strategy groups appear in composite queries
    pub const ALL: [Strategy; 3] = [
        Strategy::UnderstandIntent,
        Strategy::GatherContext,
        Strategy::SpecifyDetails,
    ];
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnderstandIntent => write!(f, "understand_intent"),
            Self::GatherContext => write!(f, "gather_context"),
            Self::SpecifyDetails => write!(f, "specify_details"),
        }
    }
}

/// Classifier verdict on how answerable a query is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    /// Clear enough to answer directly
    Simple,
    /// Needs the user's preferences or background
    Complex,
    /// Missing key information or uses fuzzy wording
    Vague,
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SIMPLE" => Ok(Label::Simple),
            "COMPLEX" => Ok(Label::Complex),
            "VAGUE" => Ok(Label::Vague),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "SIMPLE"),
            Self::Complex => write!(f, "COMPLEX"),
            Self::Vague => write!(f, "VAGUE"),
        }
    }
}

/// Result of one classification call; not stored past its round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: Label,
    pub reason: String,
}

impl Classification {
    pub fn new(label: Label, reason: impl Into<String>) -> Self {
        Self {
            label,
            reason: reason.into(),
        }
    }
}

/// One round's question and (eventually) its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based round in which the question was asked
    pub round: u32,
    pub strategy: Strategy,
    pub question: String,
    /// Absent while waiting for the user
    pub answer: Option<String>,
}

impl Turn {
    pub fn new(round: u32, strategy: Strategy, question: impl Into<String>) -> Self {
        Self {
            round,
            strategy,
            question: question.into(),
            answer: None,
        }
    }

    /// Turn that already carries an answer
    pub fn answered(round: u32, strategy: Strategy, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::new(round, strategy, question)
        }
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One clarification conversation for a single original question
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: String,
    original_query: String,
    history: Vec<Turn>,
    round: u32,
    status: SessionStatus,
    max_rounds: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session at round 0
    ///
    /// `max_rounds` below 1 is raised to 1.
    pub fn new(id: impl Into<String>, original_query: impl Into<String>, max_rounds: u32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            original_query: original_query.into(),
            history: Vec::new(),
            round: 0,
            status: SessionStatus::Active,
            max_rounds: max_rounds.max(1),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Turns that have received an answer, in round order
    pub fn answered_turns(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter().filter(|t| t.answer.is_some())
    }

    /// Question still waiting for an answer, if any
    pub fn pending_question(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|t| t.answer.is_none())
            .map(|t| t.question.as_str())
    }

    /// Attach the answer to the outstanding question
    ///
    /// Returns false, leaving the history untouched, when the session is not
    /// active or there is no unanswered trailing turn.
    pub(crate) fn record_answer(&mut self, answer: impl Into<String>) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.history.last_mut() {
            Some(turn) if turn.answer.is_none() => {
                debug!(session_id = %self.id, round = turn.round, "record_answer: answering trailing turn");
                turn.answer = Some(answer.into());
                self.touch();
                true
            }
            _ => {
                debug!(session_id = %self.id, "record_answer: no outstanding question");
                false
            }
        }
    }

    /// Commit a round that asked a new question
    pub(crate) fn push_turn(&mut self, turn: Turn) {
        debug_assert!(self.is_active(), "push_turn on a closed session");
        debug_assert_eq!(turn.round, self.round + 1, "turn round must follow the session round");
        self.round = turn.round;
        self.history.push(turn);
        self.touch();
    }

    /// Commit a round that ended the session
    pub(crate) fn complete_at(&mut self, round: u32) {
        debug_assert!(self.is_active(), "complete_at on a closed session");
        self.round = round.min(self.max_rounds).max(self.round);
        self.status = SessionStatus::Completed;
        self.touch();
    }

    /// Commit a round that failed; the session moves to `Error`
    pub(crate) fn fail_at(&mut self, round: u32) {
        if self.is_active() {
            self.round = round.min(self.max_rounds).max(self.round);
            self.status = SessionStatus::Error;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
