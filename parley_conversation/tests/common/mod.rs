//! In-process language model used by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse};

pub const EVALUATION: &str = "Harika! Görüşmek üzere.\n\n1. Yes\n2. Yes\n3. 9/10 - great, keep it up.";

/// Answers every message with `Reply to: <input>` and every wrap-up request
/// with [`EVALUATION`]. Can be told to fail, to answer empty, or to hang.
#[derive(Default)]
pub struct ScriptedProvider {
    calls: AtomicUsize,
    failures: AtomicUsize,
    empty_replies: AtomicUsize,
    delay: Option<Duration>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, times: usize) {
        self.failures.store(times, Ordering::SeqCst);
    }

    pub fn answer_empty_next(&self, times: usize) {
        self.empty_replies.store(times, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests
            .lock()
            .map(|requests| requests.last().cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> anyhow::Result<LLMResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        if take_one(&self.failures) {
            anyhow::bail!("upstream unavailable");
        }
        if take_one(&self.empty_replies) {
            return Ok(LLMResponse {
                content: "   ".to_string(),
                usage: None,
            });
        }

        let last = messages.last().map_or("", |m| m.content.as_str());
        let content = if last.contains("[The dialogue is over") {
            EVALUATION.to_string()
        } else {
            format!("Reply to: {last}")
        };

        Ok(LLMResponse {
            content,
            usage: None,
        })
    }

    fn get_default_model(&self) -> &str {
        "scripted"
    }
}
