use parley_core::{DialogueLength, Topic, clamp_history_window};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_DIR_NAME: &str = "parley";
const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variables that override values from the config file.
const ENV_API_KEY: &str = "PARLEY_API_KEY";
const ENV_MODEL: &str = "PARLEY_MODEL";
const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub agents: AgentsConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefaults {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }
}

/// Practice dialogue settings.
///
/// `default_topic` / `default_length` seed a new user's preferences; set
/// either to `null` to make users pick it before their first dialogue.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DialogueConfig {
    #[serde(default = "DialogueConfig::default_persona")]
    pub persona: String,
    #[serde(default = "DialogueConfig::default_language")]
    pub language: String,
    #[serde(default = "DialogueConfig::default_topic")]
    pub default_topic: Option<Topic>,
    #[serde(default = "DialogueConfig::default_length")]
    pub default_length: Option<DialogueLength>,
    #[serde(default = "DialogueConfig::default_history_window")]
    pub history_window: usize,
    #[serde(default = "DialogueConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            persona: Self::default_persona(),
            language: Self::default_language(),
            default_topic: Self::default_topic(),
            default_length: Self::default_length(),
            history_window: Self::default_history_window(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

impl DialogueConfig {
    fn default_persona() -> String {
        "Kemal".to_string()
    }

    fn default_language() -> String {
        "Turkish".to_string()
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_topic() -> Option<Topic> {
        Some(Topic::Casual)
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_length() -> Option<DialogueLength> {
        Some(DialogueLength::Short)
    }

    const fn default_history_window() -> usize {
        6
    }

    const fn default_request_timeout_secs() -> u64 {
        60
    }

    /// History window clamped into the allowed range.
    #[must_use]
    pub const fn history_window(&self) -> usize {
        clamp_history_window(self.history_window)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    /// Chat ids allowed to talk to the bot; empty allows everyone
    #[serde(default)]
    pub allow_from: Vec<String>,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR_NAME))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load `~/parley/config.json`, then apply `.env` and environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'parley init' to create config.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Override secrets and the model from `lookup` (normally the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = non_empty(ENV_API_KEY) {
            debug!("Using API key from {ENV_API_KEY}");
            self.providers.openai.api_key = api_key;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            debug!("Using model from {ENV_MODEL}");
            self.agents.defaults.model = model;
        }
        if let Some(token) = non_empty(ENV_TELEGRAM_TOKEN) {
            debug!("Using Telegram token from {ENV_TELEGRAM_TOKEN}");
            self.telegram.token = token;
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_path = Self::ensure_config_dir()?.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your API key (or set {ENV_API_KEY})");
        println!("   2. Add your Telegram bot token (or set {ENV_TELEGRAM_TOKEN})");
        println!("   3. Run 'parley chat' to practice in the terminal, or 'parley telegram'");
        println!();
        println!("🔧 Configuration options:");
        println!("   - dialogue.default_topic: Weather, Casual, Shopping or Food (null to ask)");
        println!("   - dialogue.default_length: 3, 5 or 10 exchanges (null to ask)");
        println!("   - dialogue.history_window: exchanges replayed to the model (5 to 8)");
        println!();
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "agents": {
    "defaults": {
      "model": "gpt-4",
      "max_tokens": 1024,
      "temperature": 0.5
    }
  },
  "providers": {
    "openai": {
      "api_key": "your-api-key-here",
      "base_url": "https://api.openai.com/v1"
    }
  },
  "dialogue": {
    "persona": "Kemal",
    "language": "Turkish",
    "default_topic": "Casual",
    "default_length": 3,
    "history_window": 6,
    "request_timeout_secs": 60
  },
  "telegram": {
    "enabled": true,
    "token": "",
    "allow_from": []
  }
}"#;
