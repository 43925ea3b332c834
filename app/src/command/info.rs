use parley_config::Config;
use parley_core::util::mask_secret;

/// Strategy for displaying configuration information.
///
/// Secrets are masked before printing.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== parley Configuration ===\n");

        println!("Provider:");
        println!("  API Key: {}", mask_secret(&config.providers.openai.api_key));
        println!("  Base URL: {}", config.providers.openai.base_url);
        println!();

        println!("Agent Defaults:");
        println!("  Model: {}", config.agents.defaults.model);
        println!("  Max Tokens: {}", config.agents.defaults.max_tokens);
        println!("  Temperature: {}", config.agents.defaults.temperature);
        println!();

        let dialogue = &config.dialogue;
        println!("Dialogue:");
        println!("  Persona: {} ({})", dialogue.persona, dialogue.language);
        println!(
            "  Default Topic: {}",
            dialogue
                .default_topic
                .map_or_else(|| "(ask user)".to_string(), |t| t.to_string())
        );
        println!(
            "  Default Length: {}",
            dialogue
                .default_length
                .map_or_else(|| "(ask user)".to_string(), |l| l.to_string())
        );
        println!("  History Window: {}", dialogue.history_window());
        println!("  Request Timeout: {}s", dialogue.request_timeout().as_secs());
        println!();

        println!("Telegram:");
        println!("  Enabled: {}", config.telegram.enabled);
        println!("  Token: {}", mask_secret(&config.telegram.token));
        if config.telegram.allow_from.is_empty() {
            println!("  Allow From: (empty - all users allowed)");
        } else {
            println!("  Allow From: {}", config.telegram.allow_from.join(", "));
        }

        Ok(())
    }
}
