//! System instructions and the wrap-up request sent to the model.
//!
//! The wording is a payload; the rubric's three criteria and its scoring
//! rules are what the evaluation has to follow.

use parley_core::Topic;

/// Scoring rules of the end-of-dialogue evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationRubric {
    pub min_score: u8,
    pub max_score: u8,
    /// Scores below this get corrective feedback with a concrete mistake.
    pub feedback_threshold: u8,
}

impl Default for EvaluationRubric {
    fn default() -> Self {
        Self {
            min_score: 1,
            max_score: 10,
            feedback_threshold: 8,
        }
    }
}

/// Who the assistant plays and which language the user practices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub persona: String,
    pub language: String,
    pub rubric: EvaluationRubric,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: "Kemal".to_string(),
            language: "Turkish".to_string(),
            rubric: EvaluationRubric::default(),
        }
    }
}

impl PromptConfig {
    /// Build the system instructions for a dialogue on `topic` lasting `turn_budget` exchanges.
    #[must_use]
    pub fn system_instructions(&self, topic: Topic, turn_budget: usize) -> String {
        let Self {
            persona,
            language,
            rubric,
        } = self;
        format!(
            "Your name is {persona}, you are a friendly {language} conversation partner for the user. \
Talk with the user in {language} only, on the subject {topic}. Be friendly and polite and use \
simple language a medium level {language} speaker understands. Reply to the user's messages and \
ask your own questions within the subject. The dialogue lasts {turn_budget} exchanges.\n\n\
When you are told the dialogue is over, do not ask any more questions. Instead wrap up the \
conversation with a reply to the last message, then evaluate the user in English:\n\
1. The user wrote in {language} - yes or no only.\n\
2. The user talked about {topic} - yes or no only.\n\
3. Score the user's {language} grammar from {min} to {max}.\n\
If the first answer is no, the score is {min}. If the second answer is no, halve the score and \
mention that the user steered off the subject. If the score is below {threshold}, give a hint \
how to improve and quote at least one exact mistake the user made and what it is. Otherwise say \
the user's language is great and they should keep it up.",
            min = rubric.min_score,
            max = rubric.max_score,
            threshold = rubric.feedback_threshold,
        )
    }
}

/// Final user message of the termination path: the optional note, then the stop instruction.
#[must_use]
pub fn wrap_up_request(final_note: &str) -> String {
    const INSTRUCTION: &str = "[The dialogue is over. Do not ask any more questions. Close out \
the last exchange naturally, then give the evaluation.]";

    let note = final_note.trim();
    if note.is_empty() {
        INSTRUCTION.to_string()
    } else {
        format!("{note}\n\n{INSTRUCTION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_carry_topic_budget_and_rubric() {
        let prompt = PromptConfig::default().system_instructions(Topic::Shopping, 5);

        assert!(prompt.contains("Kemal"));
        assert!(prompt.contains("subject Shopping"));
        assert!(prompt.contains("lasts 5 exchanges"));
        assert!(prompt.contains("1. The user wrote in Turkish"));
        assert!(prompt.contains("2. The user talked about Shopping"));
        assert!(prompt.contains("from 1 to 10"));
        assert!(prompt.contains("the score is 1"));
        assert!(prompt.contains("halve the score"));
        assert!(prompt.contains("below 8"));
    }

    #[test]
    fn test_wrap_up_request_with_and_without_note() {
        let bare = wrap_up_request("  ");
        assert!(bare.starts_with("[The dialogue is over."));

        let noted = wrap_up_request("I decided to stop conversation.");
        assert!(noted.starts_with("I decided to stop conversation.\n\n[The dialogue is over."));
    }
}
