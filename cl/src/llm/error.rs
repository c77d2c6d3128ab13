//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the chat-completions backend
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether another attempt at the same request may succeed
    ///
    /// Rate limits are not retried in-process; the backend asks for a pause
    /// much longer than a request should block for.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => matches!(*status, 408 | 500 | 502 | 503 | 504),
            LlmError::Network(e) => !e.is_builder() && !e.is_decode(),
            LlmError::Timeout(_) => true,
            LlmError::MissingApiKey(_)
            | LlmError::RateLimited { .. }
            | LlmError::InvalidResponse(_)
            | LlmError::Json(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
