use crate::keyboard::{Callback, prompt_for};
use crate::{Command, Error, Result, TelegramBot};
use parley_conversation::{ConversationError, Speaker, Turn};
use parley_core::util::{
    DEFAULT_STOP_NOTE, NO_SESSION_MESSAGE, RETRY_MESSAGE, or_goodbye, truncate,
};
use parley_core::{SelectionStep, UserId};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction, ChatId, Message};
use tracing::{info, warn};

/// Ask the user for the missing selection with an inline keyboard.
async fn send_selection_prompt(
    bot: &TelegramBot,
    chat_id: ChatId,
    step: SelectionStep,
) -> Result<()> {
    let (text, keyboard) = prompt_for(step);
    bot.bot
        .send_message(chat_id, text)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Reply to a failed conversation call; non-recoverable errors propagate.
async fn send_conversation_error(
    bot: &TelegramBot,
    chat_id: ChatId,
    error: ConversationError,
) -> Result<()> {
    match error {
        ConversationError::NotReady(step) => send_selection_prompt(bot, chat_id, step).await,
        ConversationError::NoSession => {
            bot.bot.send_message(chat_id, NO_SESSION_MESSAGE).await?;
            Ok(())
        }
        e if e.is_retryable() => {
            warn!("Model call failed, asking user to resend: {e}");
            bot.bot.send_message(chat_id, RETRY_MESSAGE).await?;
            Ok(())
        }
        e => Err(e.into()),
    }
}

/// Render a transcript with the persona's name for assistant turns.
fn format_transcript(turns: &[Turn], persona: &str) -> String {
    turns
        .iter()
        .map(|turn| match turn.speaker() {
            Speaker::User => format!("You: {}", turn.text()),
            Speaker::Assistant => format!("{persona}: {}", turn.text()),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Handle bot commands
pub async fn handle_command(
    bot: &TelegramBot,
    msg: &Message,
    user: UserId,
    cmd: Command,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");
    let registry = bot.registry();
    let prompt = &registry.settings().prompt;

    match cmd {
        Command::Start => {
            info!("[@{username}] Command: /start");
            match registry.start(user) {
                Ok(handle) => {
                    let (topic, budget) = {
                        let session = handle.lock().await;
                        (session.topic(), session.turn_budget())
                    };
                    let text = Command::welcome_text(&prompt.persona, topic.as_str(), budget);
                    bot.bot.send_message(chat_id, text).await?;
                }
                Err(e) => send_conversation_error(bot, chat_id, e).await?,
            }
        }
        Command::Topic => {
            info!("[@{username}] Command: /topic");
            send_selection_prompt(bot, chat_id, SelectionStep::SelectTopic).await?;
        }
        Command::Length => {
            info!("[@{username}] Command: /length");
            send_selection_prompt(bot, chat_id, SelectionStep::SelectLength).await?;
        }
        Command::Settings => {
            info!("[@{username}] Command: /settings");
            let text = format!("Current settings are\n{}", registry.preferences(user));
            bot.bot.send_message(chat_id, text).await?;
        }
        Command::History => {
            info!("[@{username}] Command: /history");
            let text = match registry.history(user).await {
                None => NO_SESSION_MESSAGE.to_string(),
                Some(turns) if turns.is_empty() => "Nothing has been said yet.".to_string(),
                Some(turns) => format_transcript(&turns, &prompt.persona),
            };
            bot.bot.send_message(chat_id, text).await?;
        }
        Command::End(note) => {
            info!("[@{username}] Command: /end");
            let note = if note.is_empty() {
                DEFAULT_STOP_NOTE
            } else {
                note.as_str()
            };
            bot.bot.send_chat_action(chat_id, ChatAction::Typing).await?;
            match registry.request_termination(user, note).await {
                Ok(reply) => {
                    bot.bot.send_message(chat_id, or_goodbye(reply.text())).await?;
                }
                Err(e) => send_conversation_error(bot, chat_id, e).await?,
            }
        }
        Command::Help => {
            info!("[@{username}] Command: /help");
            bot.bot
                .send_message(chat_id, Command::help_text(&prompt.persona, &prompt.language))
                .await?;
        }
    }

    Ok(())
}

/// Handle any message (commands or regular text)
pub async fn handle_message(bot: &TelegramBot, msg: &Message) -> Result<()> {
    let chat_id = msg.chat.id;
    if !bot.is_allowed(chat_id.0) {
        warn!("Rejected message from chat {chat_id}");
        return Err(Error::Unauthorized(chat_id.0));
    }

    // Channel posts and service messages carry no sender or text
    let (Some(user), Some(text)) = (msg.from.as_ref().map(|u| u.id.0), msg.text()) else {
        return Ok(());
    };
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");

    // Check if this is a command
    if let Some(cmd) = Command::parse_from_text(text) {
        return handle_command(bot, msg, user, cmd).await;
    }

    info!("[@{username}] Message: {text}");

    // Show typing indicator
    bot.bot.send_chat_action(chat_id, ChatAction::Typing).await?;

    match bot.registry().submit(user, text).await {
        Ok(reply) => {
            if reply.is_evaluation() {
                info!("[@{username}] Dialogue finished");
            }
            info!("[@{username}] Response: {}", truncate(reply.text(), 80));
            bot.bot.send_message(chat_id, or_goodbye(reply.text())).await?;
            Ok(())
        }
        Err(e) => send_conversation_error(bot, chat_id, e).await,
    }
}

/// Handle inline keyboard presses for topic and length selection
pub async fn handle_callback(bot: &TelegramBot, query: &CallbackQuery) -> Result<()> {
    let user = query.from.id.0;
    let Some(callback) = query.data.as_deref().and_then(Callback::parse) else {
        bot.bot.answer_callback_query(query.id.clone()).await?;
        return Ok(());
    };
    let origin = query.message.as_ref().map(|m| (m.chat().id, m.id()));

    if let Some((chat_id, _)) = origin {
        if !bot.is_allowed(chat_id.0) {
            warn!("Rejected callback from chat {chat_id}");
            return Err(Error::Unauthorized(chat_id.0));
        }
    }

    let registry = bot.registry();
    let selected = match &callback {
        Callback::Topic(raw) => registry.select_topic(user, raw).map(|t| t.to_string()),
        Callback::Length(raw) => registry
            .select_length(user, raw)
            .map(|l| format!("{l} messages")),
    };

    let selected = match selected {
        Ok(selected) => selected,
        Err(ConversationError::InvalidSelection(raw)) => {
            warn!("User {user} pressed unknown option {raw:?}");
            bot.bot
                .answer_callback_query(query.id.clone())
                .text("Unknown option")
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    bot.bot.answer_callback_query(query.id.clone()).await?;

    let Some((chat_id, message_id)) = origin else {
        return Ok(());
    };
    bot.bot
        .edit_message_text(chat_id, message_id, format!("Selected option: {selected}"))
        .await?;

    // Walk the user through whatever is still missing
    if let Some(step) = registry.preferences(user).next_step() {
        send_selection_prompt(bot, chat_id, step).await?;
    } else if registry.get(user).is_none() {
        bot.bot
            .send_message(chat_id, "All set! Write /start to begin the conversation.")
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_uses_persona_name() {
        let turns = vec![Turn::user("Merhaba!"), Turn::assistant("Merhaba, nasılsın?")];
        assert_eq!(
            format_transcript(&turns, "Kemal"),
            "You: Merhaba!\n\nKemal: Merhaba, nasılsın?"
        );
    }
}
