//! Bounded conversation memory.
//!
//! Keeps the most recent exchanges of a dialogue, evicting the oldest one
//! first once the configured window is full. The retained turns are replayed to
//! the language model as context, oldest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parley_core::{ChatMessage, Role};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl From<Speaker> for Role {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Self::User,
            Speaker::Assistant => Self::Assistant,
        }
    }
}

/// One recorded utterance. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
    recorded_at: DateTime<Utc>,
}

impl Turn {
    #[must_use]
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    #[must_use]
    pub const fn speaker(&self) -> Speaker {
        self.speaker
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.speaker.into(),
            content: self.text.clone(),
        }
    }
}

/// One user turn and the reply it got.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Exchange {
    user: Turn,
    reply: Turn,
}

/// FIFO window over the most recent exchanges.
///
/// Capacity counts exchanges, so the replayed context always opens with a
/// user turn and never splits a pair.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    exchanges: VecDeque<Exchange>,
    capacity: usize,
}

impl ConversationMemory {
    /// Create an empty memory. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            exchanges: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an exchange, evicting the oldest ones while over capacity.
    pub fn record_exchange(&mut self, user: Turn, reply: Turn) {
        self.exchanges.push_back(Exchange { user, reply });
        while self.exchanges.len() > self.capacity {
            self.exchanges.pop_front();
        }
    }

    /// Retained turns in order, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns().cloned().collect()
    }

    /// Retained turns rendered as chat messages for the model.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns().map(Turn::to_message).collect()
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    /// Number of retained exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.exchanges
            .iter()
            .flat_map(|exchange| [&exchange.user, &exchange.reply])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(memory: &mut ConversationMemory, i: usize) {
        memory.record_exchange(
            Turn::user(format!("Message {i}")),
            Turn::assistant(format!("Reply {i}")),
        );
    }

    fn texts(memory: &ConversationMemory) -> Vec<String> {
        memory
            .snapshot()
            .iter()
            .map(|t| t.text().to_string())
            .collect()
    }

    #[test]
    fn test_memory_keeps_most_recent_exchanges() {
        for capacity in 1..=8 {
            let mut memory = ConversationMemory::new(capacity);
            for i in 0..20 {
                exchange(&mut memory, i);
                assert!(memory.len() <= capacity);
            }

            let expected: Vec<String> = (20 - capacity..20)
                .flat_map(|i| [format!("Message {i}"), format!("Reply {i}")])
                .collect();
            assert_eq!(texts(&memory), expected);
            assert_eq!(memory.snapshot()[0].speaker(), Speaker::User);
        }
    }

    #[test]
    fn test_memory_below_capacity_keeps_everything() {
        let mut memory = ConversationMemory::new(5);
        memory.record_exchange(Turn::user("Merhaba"), Turn::assistant("Merhaba! Nasılsın?"));

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.snapshot()[0].speaker(), Speaker::User);
        assert_eq!(memory.snapshot()[1].speaker(), Speaker::Assistant);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut memory = ConversationMemory::new(0);
        assert_eq!(memory.capacity(), 1);

        exchange(&mut memory, 0);
        exchange(&mut memory, 1);
        assert_eq!(texts(&memory), vec!["Message 1".to_string(), "Reply 1".to_string()]);
    }

    #[test]
    fn test_clear_and_messages() {
        let mut memory = ConversationMemory::new(4);
        memory.record_exchange(Turn::user("Hava nasıl?"), Turn::assistant("Güneşli."));

        let messages = memory.to_messages();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Güneşli.");

        memory.clear();
        assert!(memory.is_empty());
        assert!(memory.to_messages().is_empty());
    }
}
