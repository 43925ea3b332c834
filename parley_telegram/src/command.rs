use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Topic,
    Length,
    Settings,
    History,
    /// End the dialogue now, with an optional closing note
    End(String),
    Help,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        [
            ("start", "start the conversation"),
            ("topic", "select chat topic"),
            ("length", "select chat length"),
            ("settings", "current settings"),
            ("history", "show the conversation so far"),
            ("end", "end the conversation"),
            ("help", "info"),
        ]
        .into_iter()
        .map(|(command, description)| BotCommand::new(command, description))
        .collect()
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        let (head, rest) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));

        // Remove bot mention if present (e.g., "/start@my_bot")
        let head = head.split('@').next().unwrap_or(head).to_lowercase();

        match head.as_str() {
            "/start" => Some(Self::Start),
            "/topic" => Some(Self::Topic),
            "/length" => Some(Self::Length),
            "/settings" => Some(Self::Settings),
            "/history" => Some(Self::History),
            "/end" => Some(Self::End(rest.trim().to_string())),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }

    #[must_use]
    pub fn help_text(persona: &str, language: &str) -> String {
        format!(
            r"
I am {persona}, your {language} conversation partner. I will talk to you in {language} and help you with your language skills!

/start    - start the conversation
/topic    - select chat topic
/length   - select chat length
/settings - current settings
/history  - show the conversation so far
/end      - end the conversation
/help     - info
"
        )
    }

    #[must_use]
    pub fn welcome_text(persona: &str, topic: &str, length: usize) -> String {
        format!(
            "{persona} is here! Conversation topic is {topic}, we will talk for {length} messages. \
Type /help to see all of the options. Say Merhaba! 🙌🏻"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse_from_text("/start"), Some(Command::Start));
        assert_eq!(Command::parse_from_text("/START@parley_bot"), Some(Command::Start));
        assert_eq!(Command::parse_from_text(" /settings "), Some(Command::Settings));
        assert_eq!(Command::parse_from_text("merhaba"), None);
        assert_eq!(Command::parse_from_text("/unknown"), None);
    }

    #[test]
    fn test_end_keeps_note_verbatim() {
        assert_eq!(Command::parse_from_text("/end"), Some(Command::End(String::new())));
        assert_eq!(
            Command::parse_from_text("/end Yorgunum, Sonra Konuşalım"),
            Some(Command::End("Yorgunum, Sonra Konuşalım".to_string()))
        );
    }

    #[test]
    fn test_bot_commands_cover_every_command() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 7);
        for command in &commands {
            let parsed = Command::parse_from_text(&format!("/{}", command.command));
            assert!(parsed.is_some(), "/{} should parse", command.command);
        }
    }
}
