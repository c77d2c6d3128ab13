//! Clarifier - Multi-turn Query Clarification
//!
//! Takes an under-specified question and, over a bounded number of rounds,
//! asks targeted follow-ups until the question can be restated as one
//! precise query.
//!
//! # Core Concepts
//!
//! - **Classify, then ask**: each round labels the current query SIMPLE,
//!   COMPLEX or VAGUE; only non-simple queries get a follow-up
//! - **Strategy order**: intent first, context once when it matters, then details
//! - **Bounded**: a session never runs more than `max-rounds` rounds
//! - **Always an answer**: if final synthesis fails, a local assembly is used
//!
//! # Modules
//!
//! - [`clarify`] - Session state machine, strategy planner, session store
//! - [`collaborator`] - Classifier / question / final-query traits and LLM implementation
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`prompts`] - Prompt templates
//! - [`server`] - HTTP API
//! - [`console`] - Interactive terminal mode
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod clarify;
pub mod cli;
pub mod collaborator;
pub mod config;
pub mod console;
pub mod llm;
pub mod prompts;
pub mod server;

pub use clarify::{
    Clarifier, ClarifyError, ClarifyResult, Classification, Collaborators, Label, Locale, RoundOutcome, Session,
    SessionStateMachine, SessionStatus, SessionStore, Strategy, StrategyPlanner, Turn,
};
pub use collaborator::{Classifier, CollaboratorError, FinalQueryGenerator, LlmCollaborator, QuestionGenerator};
pub use config::Config;
pub use llm::{LlmClient, LlmError, create_client};
