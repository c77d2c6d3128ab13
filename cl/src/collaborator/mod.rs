//! External collaborators of the clarification core
//!
//! The state machine only sees these three narrow traits. Prompts, JSON
//! schemas and the model provider live behind them in [`LlmCollaborator`].

use async_trait::async_trait;
use thiserror::Error;

use crate::clarify::Classification;
use crate::llm::LlmError;

mod llm;
mod parse;

pub use llm::LlmCollaborator;
pub use parse::extract_json_object;

/// Failure of a single collaborator call
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not parse collaborator output: {0}")]
    Parse(String),

    #[error("Collaborator output is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown classification label '{0}'")]
    UnknownLabel(String),

    #[error("Collaborator returned an empty {0}")]
    Empty(&'static str),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

/// Decides whether a query is answerable as asked
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<Classification, CollaboratorError>;
}

/// Produces one follow-up question for a query
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// `hint` carries the classification reason and the strategy goal
    async fn generate_question(&self, query: &str, hint: &str) -> Result<String, CollaboratorError>;
}

/// Rewrites a clarification summary into a single natural question
#[async_trait]
pub trait FinalQueryGenerator: Send + Sync {
    async fn synthesize_final(&self, summary: &str) -> Result<String, CollaboratorError>;
}
