//! Practice dialogue in the terminal.
//!
//! Drives the same registry as the Telegram bot for a single local user,
//! with the bot commands typed on stdin.

use std::io::Write;

use parley_conversation::{ConversationError, SessionRegistry, Speaker};
use parley_core::util::{DEFAULT_STOP_NOTE, NO_SESSION_MESSAGE, RETRY_MESSAGE, or_goodbye};
use parley_core::{DialogueLength, SelectionStep, Topic, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::build_registry;
use parley_config::Config;

/// The terminal has exactly one user.
const LOCAL_USER: UserId = 0;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional model override
    pub model: Option<String>,
    /// Topic to select before the first dialogue
    pub topic: Option<String>,
    /// Length to select before the first dialogue
    pub length: Option<String>,
}

/// A line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleInput<'a> {
    Start,
    Topic(&'a str),
    Length(&'a str),
    Settings,
    History,
    End(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
    Text(&'a str),
}

impl<'a> ConsoleInput<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return Self::Text(line);
        }

        let (command, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = arg.trim();
        match command.to_lowercase().as_str() {
            "/start" => Self::Start,
            "/topic" => Self::Topic(arg),
            "/length" => Self::Length(arg),
            "/settings" => Self::Settings,
            "/history" => Self::History,
            "/end" => Self::End(arg),
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Unknown(command),
        }
    }
}

fn topic_choices() -> String {
    Topic::ALL.map(Topic::as_str).join(", ")
}

fn length_choices() -> String {
    DialogueLength::ALL.map(|l| l.to_string()).join(", ")
}

fn print_step(step: SelectionStep) {
    match step {
        SelectionStep::SelectTopic => {
            println!("Choose chat topic with /topic <name>: {}", topic_choices());
        }
        SelectionStep::SelectLength => {
            println!("Choose chat length with /length <n>: {}", length_choices());
        }
    }
}

fn print_help(registry: &SessionRegistry) {
    let prompt = &registry.settings().prompt;
    println!(
        "I am {}, your {} conversation partner.\n",
        prompt.persona, prompt.language
    );
    println!("/start          - start the conversation");
    println!("/topic <name>   - select chat topic ({})", topic_choices());
    println!("/length <n>     - select chat length ({})", length_choices());
    println!("/settings       - current settings");
    println!("/history        - show the conversation so far");
    println!("/end [note]     - end the conversation");
    println!("/help           - info");
    println!("/quit           - leave");
}

/// Print the user-facing outcome of a failed call; unexpected errors propagate.
fn report(error: ConversationError) -> anyhow::Result<()> {
    match error {
        ConversationError::NotReady(step) => print_step(step),
        ConversationError::NoSession => println!("{NO_SESSION_MESSAGE}"),
        ConversationError::InvalidSelection(raw) => println!("Unknown option: {raw}"),
        e if e.is_retryable() => {
            warn!("Model call failed: {e}");
            println!("{RETRY_MESSAGE}");
        }
        e => return Err(e.into()),
    }
    Ok(())
}

async fn handle_line(registry: &SessionRegistry, input: ConsoleInput<'_>) -> anyhow::Result<()> {
    let persona = &registry.settings().prompt.persona;

    match input {
        ConsoleInput::Start => match registry.start(LOCAL_USER) {
            Ok(handle) => {
                let (topic, budget) = {
                    let session = handle.lock().await;
                    (session.topic(), session.turn_budget())
                };
                println!(
                    "{persona} is here! Conversation topic is {topic}, we will talk for {budget} messages."
                );
            }
            Err(e) => report(e)?,
        },
        ConsoleInput::Topic("") => print_step(SelectionStep::SelectTopic),
        ConsoleInput::Topic(raw) => match registry.select_topic(LOCAL_USER, raw) {
            Ok(topic) => println!("Selected option: {topic}"),
            Err(e) => report(e)?,
        },
        ConsoleInput::Length("") => print_step(SelectionStep::SelectLength),
        ConsoleInput::Length(raw) => match registry.select_length(LOCAL_USER, raw) {
            Ok(length) => println!("Selected option: {length} messages"),
            Err(e) => report(e)?,
        },
        ConsoleInput::Settings => {
            println!("Current settings are\n{}", registry.preferences(LOCAL_USER));
        }
        ConsoleInput::History => match registry.history(LOCAL_USER).await {
            None => println!("{NO_SESSION_MESSAGE}"),
            Some(turns) if turns.is_empty() => println!("Nothing has been said yet."),
            Some(turns) => {
                for turn in turns {
                    let speaker = match turn.speaker() {
                        Speaker::User => "You",
                        Speaker::Assistant => persona.as_str(),
                    };
                    println!("{speaker}: {}", turn.text());
                }
            }
        },
        ConsoleInput::End(note) => {
            let note = if note.is_empty() { DEFAULT_STOP_NOTE } else { note };
            match registry.request_termination(LOCAL_USER, note).await {
                Ok(reply) => println!("{}", or_goodbye(reply.text())),
                Err(e) => report(e)?,
            }
        }
        ConsoleInput::Help => print_help(registry),
        ConsoleInput::Unknown(command) => {
            println!("Unknown command {command}. Type /help to see all of the options.");
        }
        ConsoleInput::Text("") | ConsoleInput::Quit => {}
        ConsoleInput::Text(text) => match registry.submit(LOCAL_USER, text).await {
            Ok(reply) => println!("{persona}: {}", or_goodbye(reply.text())),
            Err(e) => report(e)?,
        },
    }

    Ok(())
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let registry = build_registry(&config, input.model);

        if let Some(topic) = input.topic {
            registry.select_topic(LOCAL_USER, &topic)?;
        }
        if let Some(length) = input.length {
            registry.select_length(LOCAL_USER, &length)?;
        }

        print_help(&registry);
        println!("\nCurrent settings are\n{}", registry.preferences(LOCAL_USER));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = ConsoleInput::parse(&line);
            if input == ConsoleInput::Quit {
                break;
            }
            handle_line(&registry, input).await?;
        }

        info!("Leaving chat, {} session(s) in memory", registry.session_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_input() {
        assert_eq!(ConsoleInput::parse("  Merhaba!  "), ConsoleInput::Text("Merhaba!"));
        assert_eq!(ConsoleInput::parse("/topic food"), ConsoleInput::Topic("food"));
        assert_eq!(ConsoleInput::parse("/LENGTH 5"), ConsoleInput::Length("5"));
        assert_eq!(ConsoleInput::parse("/length"), ConsoleInput::Length(""));
        assert_eq!(
            ConsoleInput::parse("/end Yeter, teşekkürler"),
            ConsoleInput::End("Yeter, teşekkürler")
        );
        assert_eq!(ConsoleInput::parse("/quit"), ConsoleInput::Quit);
        assert_eq!(ConsoleInput::parse("/dance"), ConsoleInput::Unknown("/dance"));
    }

    #[test]
    fn test_choices_list_every_option() {
        assert_eq!(topic_choices(), "Weather, Casual, Shopping, Food");
        assert_eq!(length_choices(), "3, 5, 10");
    }
}
