//! Dialogue session state machine.
//!
//! A session is `Active` until either its turn budget runs out (the next
//! submitted input becomes the final note) or the user asks to stop. Both
//! triggers share one termination path that asks the model to close the
//! conversation and evaluate the user, after which the session is `Ended`.
//!
//! State is only mutated after the model answered successfully, so a failed
//! or timed-out call can be retried with the same input.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::util::SESSION_ENDED_MESSAGE;
use parley_core::{ChatMessage, CompletionOptions, LLMProvider, Topic, clamp_history_window};
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use crate::budget::TurnBudget;
use crate::error::{ConversationError, Result};
use crate::history::{ConversationMemory, Turn};
use crate::prompt::{PromptConfig, wrap_up_request};

/// Fewer completed exchanges than this are not worth evaluating.
const MIN_TURNS_FOR_EVALUATION: usize = 2;

/// Settings shared by every session a registry creates.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Model, temperature and token limit, passed to the provider untouched
    pub completion: CompletionOptions,
    /// Number of exchanges replayed to the model
    pub history_window: usize,
    /// Upper bound on a single model call
    pub request_timeout: Duration,
    /// Persona, practiced language and evaluation rubric
    pub prompt: PromptConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            completion: CompletionOptions::default(),
            history_window: 6,
            request_timeout: Duration::from_secs(60),
            prompt: PromptConfig::default(),
        }
    }
}

impl SessionSettings {
    /// Set the history window, clamped into the allowed range.
    #[must_use]
    pub const fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = clamp_history_window(window);
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_completion(mut self, completion: CompletionOptions) -> Self {
        self.completion = completion;
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptConfig) -> Self {
        self.prompt = prompt;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Ended,
}

/// What a session answered to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Normal in-dialogue answer
    Answer(String),
    /// Wrap-up and evaluation; empty when the dialogue was too short to evaluate
    Evaluation(String),
    /// The session had already ended
    Ended,
}

impl Reply {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) | Self::Evaluation(text) => text,
            Self::Ended => SESSION_ENDED_MESSAGE,
        }
    }

    #[must_use]
    pub const fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }
}

/// One user's practice dialogue.
pub struct DialogueSession {
    id: Uuid,
    topic: Topic,
    budget: TurnBudget,
    memory: ConversationMemory,
    state: SessionState,
    evaluation: Option<String>,
    instructions: String,
    provider: Arc<dyn LLMProvider>,
    completion: CompletionOptions,
    request_timeout: Duration,
    started_at: DateTime<Utc>,
}

impl DialogueSession {
    #[must_use]
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        topic: Topic,
        turn_budget: usize,
        settings: &SessionSettings,
    ) -> Self {
        let budget = TurnBudget::new(turn_budget);
        let id = Uuid::now_v7();
        info!(
            "Creating dialogue session {id}: topic={topic}, budget={}, window={}",
            budget.budget(),
            settings.history_window
        );

        Self {
            id,
            topic,
            instructions: settings.prompt.system_instructions(topic, budget.budget()),
            budget,
            memory: ConversationMemory::new(settings.history_window),
            state: SessionState::Active,
            evaluation: None,
            provider,
            completion: settings.completion.clone(),
            request_timeout: settings.request_timeout,
            started_at: Utc::now(),
        }
    }

    /// Submit one user turn.
    ///
    /// Once the budget is exhausted the input is routed into the termination
    /// path instead of a normal exchange. After the session ended every call
    /// returns [`Reply::Ended`] without touching state.
    pub async fn submit(&mut self, user_input: &str) -> Result<Reply> {
        if self.is_ended() {
            debug!("Session {} already ended, ignoring input", self.id);
            return Ok(Reply::Ended);
        }

        if self.budget.is_budget_exhausted() {
            info!(
                "Session {} reached its budget of {} turns, wrapping up",
                self.id,
                self.budget.budget()
            );
            return self.conclude(user_input).await;
        }

        let turn_number = self.budget.completed() + 1;
        debug!("Processing turn {turn_number} for session {}", self.id);

        let mut messages = self.context();
        messages.push(ChatMessage::user(user_input));
        let answer = self.complete(&messages).await?;

        self.memory
            .record_exchange(Turn::user(user_input), Turn::assistant(answer.as_str()));
        self.budget.record_turn();

        debug!(
            "Turn {turn_number} completed for session {} ({} remaining)",
            self.id,
            self.budget.remaining()
        );
        Ok(Reply::Answer(answer))
    }

    /// End the dialogue now, regardless of the remaining budget.
    ///
    /// Returns an empty evaluation when the session already ended or when
    /// fewer than two exchanges happened; the model is not called then.
    pub async fn request_termination(&mut self, final_note: &str) -> Result<Reply> {
        if self.is_ended() {
            return Ok(Reply::Evaluation(String::new()));
        }

        info!(
            "Termination requested for session {} after {} turns",
            self.id,
            self.budget.completed()
        );
        self.conclude(final_note).await
    }

    /// Retained turns, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.memory.snapshot()
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    #[must_use]
    pub const fn turn_budget(&self) -> usize {
        self.budget.budget()
    }

    #[must_use]
    pub const fn turns_completed(&self) -> usize {
        self.budget.completed()
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// The final evaluation, once the model produced one.
    #[must_use]
    pub fn evaluation(&self) -> Option<&str> {
        self.evaluation.as_deref()
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Shared termination path.
    async fn conclude(&mut self, final_note: &str) -> Result<Reply> {
        if self.budget.completed() < MIN_TURNS_FOR_EVALUATION {
            info!(
                "Session {} too short to evaluate ({} turns), ending without evaluation",
                self.id,
                self.budget.completed()
            );
            self.finish(None);
            return Ok(Reply::Evaluation(String::new()));
        }

        let mut messages = self.context();
        messages.push(ChatMessage::user(wrap_up_request(final_note)));
        let evaluation = self.complete(&messages).await?;

        self.finish(Some(evaluation.clone()));
        Ok(Reply::Evaluation(evaluation))
    }

    fn finish(&mut self, evaluation: Option<String>) {
        let elapsed = Utc::now() - self.started_at;
        info!(
            "Session {} ended after {} turns in {}s",
            self.id,
            self.budget.completed(),
            elapsed.num_seconds()
        );
        self.state = SessionState::Ended;
        self.memory.clear();
        self.evaluation = evaluation;
    }

    /// System instructions followed by the retained history.
    fn context(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 * self.memory.len() + 2);
        messages.push(ChatMessage::system(self.instructions.as_str()));
        messages.extend(self.memory.to_messages());
        messages
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = timeout(
            self.request_timeout,
            self.provider.chat(messages, &self.completion),
        )
        .await
        .map_err(|_| ConversationError::Timeout(self.request_timeout))??;

        if response.content.trim().is_empty() {
            return Err(ConversationError::EmptyResponse);
        }

        if let Some(usage) = response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_clamp_history_window() {
        assert_eq!(SessionSettings::default().with_history_window(2).history_window, 5);
        assert_eq!(SessionSettings::default().with_history_window(7).history_window, 7);
        assert_eq!(SessionSettings::default().with_history_window(50).history_window, 8);
    }

    #[test]
    fn test_reply_text() {
        assert_eq!(Reply::Answer("Merhaba!".into()).text(), "Merhaba!");
        assert_eq!(Reply::Ended.text(), SESSION_ENDED_MESSAGE);
        assert!(Reply::Evaluation(String::new()).is_evaluation());
        assert!(!Reply::Ended.is_evaluation());
    }
}
