//! Inline keyboards for the topic and length selection steps.

use parley_core::{DialogueLength, SelectionStep, Topic};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

const TOPIC_PREFIX: &str = "topic:";
const LENGTH_PREFIX: &str = "length:";

/// A button press, carrying the raw value for the registry to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Topic(String),
    Length(String),
}

impl Callback {
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(topic) = data.strip_prefix(TOPIC_PREFIX) {
            Some(Self::Topic(topic.to_string()))
        } else {
            data.strip_prefix(LENGTH_PREFIX)
                .map(|length| Self::Length(length.to_string()))
        }
    }
}

#[must_use]
pub fn topic_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([Topic::ALL.map(|topic| {
        InlineKeyboardButton::callback(topic.as_str(), format!("{TOPIC_PREFIX}{topic}"))
    })])
}

#[must_use]
pub fn length_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([DialogueLength::ALL.map(|length| {
        InlineKeyboardButton::callback(
            format!("{length} messages"),
            format!("{LENGTH_PREFIX}{length}"),
        )
    })])
}

/// Prompt text and keyboard asking for `step`.
#[must_use]
pub fn prompt_for(step: SelectionStep) -> (&'static str, InlineKeyboardMarkup) {
    match step {
        SelectionStep::SelectTopic => ("Choose chat topic", topic_keyboard()),
        SelectionStep::SelectLength => ("Great! How long should we chat?", length_keyboard()),
    }
}
