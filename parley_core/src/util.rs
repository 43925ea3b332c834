//! Fixed user-facing texts and small string helpers shared by the front ends.

/// Returned for every turn submitted after a dialogue has ended.
pub const SESSION_ENDED_MESSAGE: &str =
    "The conversation has ended. To start a new conversation, please use the /start command.";

/// Shown when a turn arrives for a user without any session.
pub const NO_SESSION_MESSAGE: &str =
    "There is no active conversation. Please write /start to begin one.";

/// Shown when the language model failed or timed out; the same input can be resent.
pub const RETRY_MESSAGE: &str =
    "Sorry, I could not reach the language model. Please send your message again.";

/// Shown after an explicit end when there was too little dialogue to evaluate.
pub const GOODBYE_MESSAGE: &str = "Goodbye! Talk to you again soon.";

/// Default note attached to a manual end request that carries no text.
pub const DEFAULT_STOP_NOTE: &str = "I decided to stop conversation.";

/// Text to show for a reply, falling back to [`GOODBYE_MESSAGE`] when it is empty.
#[must_use]
pub fn or_goodbye(text: &str) -> &str {
    if text.trim().is_empty() {
        GOODBYE_MESSAGE
    } else {
        text
    }
}

/// Mask a secret for display, keeping only a short prefix and suffix.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Shorten `s` to at most `max_chars` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_secrets() {
        assert_eq!(mask_secret("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret(""), "(not set)");
    }

    #[test]
    fn empty_evaluation_becomes_goodbye() {
        assert_eq!(or_goodbye(""), GOODBYE_MESSAGE);
        assert_eq!(or_goodbye("Score: 7/10"), "Score: 7/10");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("merhaba", 10), "merhaba");
        assert_eq!(truncate("güzel bir gün", 8), "güzel...");
    }
}
