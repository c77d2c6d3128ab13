//! Clarification error types

use thiserror::Error;

use super::types::SessionStatus;
use crate::collaborator::CollaboratorError;

/// Collaborator call that failed within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    GenerateQuestion,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classify => write!(f, "classification"),
            Self::GenerateQuestion => write!(f, "question generation"),
        }
    }
}

/// Errors from clarification operations
#[derive(Debug, Error)]
pub enum ClarifyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {id} is already {status}")]
    SessionClosed { id: String, status: SessionStatus },

    #[error("Session already exists: {0}")]
    SessionExists(String),

    #[error("{stage} failed: {source}")]
    Collaborator {
        stage: Stage,
        #[source]
        source: CollaboratorError,
    },
}

impl ClarifyError {
    /// Whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ClarifyError::Collaborator { .. })
    }
}

/// Result type for clarification operations
pub type ClarifyResult<T> = Result<T, ClarifyError>;
