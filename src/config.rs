use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

const DEFAULT_PROMPT: &str = "$ ";
const DEFAULT_HISTORY_LIMIT: usize = 100;

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_welcome() -> Vec<String> {
    vec![
        "Welcome to the Secure Booking Service!".to_string(),
        "Type 'help' to see the available commands.".to_string(),
    ]
}

/// Settings of one terminal session, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_welcome")]
    pub welcome: Vec<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            history_limit: default_history_limit(),
            welcome: default_welcome(),
        }
    }
}

impl TerminalConfig {
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookterm")
            .join("config.toml")
    }

    /// Loads configuration from the given file, falling back to defaults
    /// when no file exists.
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str::<TerminalConfig>(&content)?
        } else {
            info!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            TerminalConfig::default()
        };

        // A zero history limit would make the ring buffer unusable.
        if config.history_limit == 0 {
            config.history_limit = DEFAULT_HISTORY_LIMIT;
        }
        Ok(config)
    }

    /// Saves the configuration to file, creating parent directories.
    pub async fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        info!("Configuration saved to: {}", config_path.display());
        Ok(())
    }
}
