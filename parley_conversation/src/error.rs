use std::time::Duration;

use parley_core::SelectionStep;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversationError>;

/// Errors that can occur while running a practice dialogue.
///
/// Model-side failures never mutate the session, so the same call can be retried.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Preferences incomplete, next step: {0}")]
    NotReady(SelectionStep),

    #[error("LLM provider error: {0}")]
    ModelUnavailable(#[from] anyhow::Error),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No session for this user")]
    NoSession,
}

impl ConversationError {
    /// Whether resending the same input may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable(_) | Self::Timeout(_) | Self::EmptyResponse
        )
    }
}
