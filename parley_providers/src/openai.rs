use std::time::Duration;

use async_trait::async_trait;
use parley_core::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse, Usage};
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::info;

use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    retry_delays: Vec<Duration>,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAIProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_delays(mut self, retry_delays: Vec<Duration>) -> Self {
        self.retry_delays = retry_delays;
        self
    }

    /// Helper method to send a single request
    async fn try_send(&self, request: &serde_json::Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
            .to_string();

        let count = |u: &serde_json::Map<String, serde_json::Value>, key: &str| {
            u.get(key)
                .and_then(serde_json::Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        let usage = response["usage"].as_object().map(|u| Usage {
            prompt_tokens: count(u, "prompt_tokens"),
            completion_tokens: count(u, "completion_tokens"),
            total_tokens: count(u, "total_tokens"),
        });

        Ok(LLMResponse { content, usage })
    }
}

/// Connection failures, timeouts, 5xx and 429 are worth another attempt.
/// Client errors and unparseable bodies are not.
fn is_transient(err: &anyhow::Error) -> bool {
    let Some(err) = err.downcast_ref::<reqwest::Error>() else {
        return false;
    };
    err.status().map_or_else(
        || err.is_connect() || err.is_timeout(),
        |status| status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
    )
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "model": options.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        info!(
            "Sending request to chat completions API: model={}, messages={}",
            options.model,
            messages.len()
        );

        let response =
            retry_with_backoff(|| self.try_send(&request), &self.retry_delays, is_transient)
                .await?;

        info!("Received response from chat completions API");
        Ok(response)
    }

    fn get_default_model(&self) -> &'static str {
        "gpt-4"
    }
}
