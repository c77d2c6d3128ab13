//! Clarification core
//!
//! Runs multi-round sessions that turn an under-specified question into a
//! precise final question:
//!
//! 1. classify the current query (SIMPLE, COMPLEX or VAGUE)
//! 2. if it is clear or the round limit is hit, synthesize the final question
//! 3. otherwise plan a strategy, ask one follow-up and wait for the answer
//! 4. fold the answer into the query and go back to 1

mod error;
mod fold;
mod locale;
mod machine;
mod service;
mod store;
mod strategy;
mod synthesis;
mod types;

pub use error::{ClarifyError, ClarifyResult, Stage};
pub use fold::{
    answers_for, conversation_summary, fallback_final_query, fold_current_query, render_transcript, strategy_hint,
};
pub use locale::Locale;
pub use machine::{Collaborators, RoundOutcome, SessionStateMachine};
pub use service::Clarifier;
pub use store::{SessionHandle, SessionStore};
pub use strategy::StrategyPlanner;
pub use synthesis::{Synthesis, synthesize};
pub use types::{Classification, Label, Session, SessionStatus, Strategy, Turn};
