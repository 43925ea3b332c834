use std::fmt;

use parley_core::{DialogueLength, SelectionStep, Topic};

/// Remembered topic and length of one user, seeding their next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferenceRecord {
    pub topic: Option<Topic>,
    pub length: Option<DialogueLength>,
}

impl PreferenceRecord {
    #[must_use]
    pub const fn new(topic: Option<Topic>, length: Option<DialogueLength>) -> Self {
        Self { topic, length }
    }

    /// The next missing choice, length first; `None` once both are set.
    #[must_use]
    pub const fn next_step(&self) -> Option<SelectionStep> {
        if self.length.is_none() {
            Some(SelectionStep::SelectLength)
        } else if self.topic.is_none() {
            Some(SelectionStep::SelectTopic)
        } else {
            None
        }
    }

    /// Both choices, if complete.
    #[must_use]
    pub const fn selection(&self) -> Option<(Topic, DialogueLength)> {
        match (self.topic, self.length) {
            (Some(topic), Some(length)) => Some((topic, length)),
            _ => None,
        }
    }
}

impl fmt::Display for PreferenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topic = self.topic.map_or("(not selected)", Topic::as_str);
        match self.length {
            Some(length) => write!(f, "Topic: {topic}\nChat length: {length}"),
            None => write!(f, "Topic: {topic}\nChat length: (not selected)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_step_asks_for_length_first() {
        let empty = PreferenceRecord::default();
        assert_eq!(empty.next_step(), Some(SelectionStep::SelectLength));

        let length_only = PreferenceRecord::new(None, Some(DialogueLength::Medium));
        assert_eq!(length_only.next_step(), Some(SelectionStep::SelectTopic));

        let complete = PreferenceRecord::new(Some(Topic::Food), Some(DialogueLength::Medium));
        assert_eq!(complete.next_step(), None);
        assert_eq!(
            complete.selection(),
            Some((Topic::Food, DialogueLength::Medium))
        );
    }

    #[test]
    fn test_display() {
        let record = PreferenceRecord::new(Some(Topic::Casual), Some(DialogueLength::Short));
        assert_eq!(record.to_string(), "Topic: Casual\nChat length: 3");
    }
}
