use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_provider_timeout() -> u64 {
    30
}

fn default_bot_timeout() -> u64 {
    10
}

fn default_server_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
    /// Where the cache is dumped on shutdown; no dump when unset
    pub snapshot_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: default_server_address(),
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotConfig {
    pub token: String,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_bot_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    pub bot: Option<BotConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxr", "fxr")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn provider(&self) -> Result<&ProviderConfig> {
        self.provider
            .as_ref()
            .context("Missing `provider` section in config")
    }

    pub fn bot(&self) -> Result<&BotConfig> {
        self.bot.as_ref().context("Missing `bot` section in config")
    }
}
