//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use parley_config::Config;
use parley_conversation::{PreferenceRecord, PromptConfig, SessionRegistry, SessionSettings};
use parley_core::{CompletionOptions, LLMProvider};
use parley_providers::OpenAIProvider;
use std::sync::Arc;
use tracing::info;

mod chat;
mod info;
mod init;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Session settings derived from the config file.
fn build_session_settings(config: &Config, model: Option<String>) -> SessionSettings {
    let defaults = &config.agents.defaults;
    let dialogue = &config.dialogue;

    SessionSettings::default()
        .with_completion(CompletionOptions {
            model: model.unwrap_or_else(|| defaults.model.clone()),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        })
        .with_history_window(dialogue.history_window())
        .with_request_timeout(dialogue.request_timeout())
        .with_prompt(PromptConfig {
            persona: dialogue.persona.clone(),
            language: dialogue.language.clone(),
            ..PromptConfig::default()
        })
}

/// Build the session registry shared by every front end.
fn build_registry(config: &Config, model: Option<String>) -> SessionRegistry {
    let provider: Arc<dyn LLMProvider> = Arc::new(
        OpenAIProvider::new(config.providers.openai.api_key.clone())
            .with_base_url(config.providers.openai.base_url.clone()),
    );
    let model = model
        .or_else(|| Some(config.agents.defaults.model.clone()).filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| provider.get_default_model().to_string());
    let settings = build_session_settings(config, Some(model));

    info!(
        "Dialogue settings: model={}, window={}, timeout={}s",
        settings.completion.model,
        settings.history_window,
        settings.request_timeout.as_secs()
    );

    SessionRegistry::new(provider, settings).with_defaults(PreferenceRecord::new(
        config.dialogue.default_topic,
        config.dialogue.default_length,
    ))
}

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
