//! HTTP message types
//!
//! Requests and responses are single JSON objects; responses are tagged by
//! a `status` field.

use serde::{Deserialize, Serialize};

use crate::clarify::RoundOutcome;

/// Body of `POST /clarify/start`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StartRequest {
    pub session_id: String,
    pub query: String,
}

/// Body of `POST /clarify/continue`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContinueRequest {
    pub session_id: String,
    pub answer: String,
}

/// Body of `POST /clarify/finish`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FinishRequest {
    pub session_id: String,
}

/// Response to the clarify endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClarifyResponse {
    /// A follow-up question is waiting for `/clarify/continue`
    WaitingAnswer {
        question: String,
        round: u32,
        session_id: String,
    },

    /// The session is closed
    Completed {
        final_query: String,
        round: u32,
        session_id: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        degraded: bool,
    },

    /// The request failed
    Error { message: String },
}

impl ClarifyResponse {
    pub fn from_outcome(session_id: &str, outcome: RoundOutcome) -> Self {
        match outcome {
            RoundOutcome::WaitingAnswer { question, round } => Self::WaitingAnswer {
                question,
                round,
                session_id: session_id.to_string(),
            },
            RoundOutcome::Completed {
                final_query,
                round,
                degraded,
            } => Self::Completed {
                final_query,
                round,
                session_id: session_id.to_string(),
                degraded,
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Response to `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

impl HealthResponse {
    pub fn healthy(sessions: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            sessions,
        }
    }
}
