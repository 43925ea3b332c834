//! Enumerated dialogue choices a user picks before a practice session starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

const HISTORY_WINDOW_MIN: usize = 5;
const HISTORY_WINDOW_MAX: usize = 8;

/// Allowed size of the replayed history window, independent of the dialogue length.
pub const HISTORY_WINDOW_RANGE: RangeInclusive<usize> = HISTORY_WINDOW_MIN..=HISTORY_WINDOW_MAX;

/// Clamp a configured history window into [`HISTORY_WINDOW_RANGE`].
#[must_use]
pub const fn clamp_history_window(window: usize) -> usize {
    if window < HISTORY_WINDOW_MIN {
        HISTORY_WINDOW_MIN
    } else if window > HISTORY_WINDOW_MAX {
        HISTORY_WINDOW_MAX
    } else {
        window
    }
}

/// Subject the assistant keeps the conversation on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Topic {
    Weather,
    #[default]
    Casual,
    Shopping,
    Food,
}

impl Topic {
    pub const ALL: [Self; 4] = [Self::Weather, Self::Casual, Self::Shopping, Self::Food];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "Weather",
            Self::Casual => "Casual",
            Self::Shopping => "Shopping",
            Self::Food => "Food",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a raw value is outside an enumerated choice set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice(pub String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown choice: {}", self.0)
    }
}

impl std::error::Error for UnknownChoice {}

impl FromStr for Topic {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownChoice(s.to_string()))
    }
}

/// Number of exchanges a practice dialogue lasts before it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "usize", into = "usize")]
pub enum DialogueLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl DialogueLength {
    pub const ALL: [Self; 3] = [Self::Short, Self::Medium, Self::Long];

    #[must_use]
    pub const fn turns(self) -> usize {
        match self {
            Self::Short => 3,
            Self::Medium => 5,
            Self::Long => 10,
        }
    }
}

impl fmt::Display for DialogueLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.turns())
    }
}

impl TryFrom<usize> for DialogueLength {
    type Error = UnknownChoice;

    fn try_from(turns: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|l| l.turns() == turns)
            .ok_or_else(|| UnknownChoice(turns.to_string()))
    }
}

impl From<DialogueLength> for usize {
    fn from(length: DialogueLength) -> Self {
        length.turns()
    }
}

impl FromStr for DialogueLength {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.parse::<usize>()
            .map_err(|_| UnknownChoice(s.to_string()))
            .and_then(Self::try_from)
    }
}

/// The next choice a user has to make before a session can be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStep {
    SelectTopic,
    SelectLength,
}

impl fmt::Display for SelectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectTopic => f.write_str("select_topic"),
            Self::SelectLength => f.write_str("select_length"),
        }
    }
}
