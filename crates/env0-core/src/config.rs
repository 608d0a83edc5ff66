//! Configuration management for env0.
//!
//! Loads configuration from ${ENV0_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// Typing effect settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub enabled: bool,
    pub char_delay_ms: u64,
    pub line_delay_ms: u64,
    pub max_chars_per_line: usize,
    pub scene_intro_delay_ms: u64,
    pub scene_padding_lines: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            char_delay_ms: 14,
            line_delay_ms: 40,
            max_chars_per_line: 600,
            scene_intro_delay_ms: 260,
            scene_padding_lines: 2,
        }
    }
}

impl TypingConfig {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }

    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }

    pub fn scene_intro_delay(&self) -> Duration {
        Duration::from_millis(self.scene_intro_delay_ms)
    }
}

/// Scrollback buffer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollbackConfig {
    pub max_lines: usize,
}

impl Default for ScrollbackConfig {
    fn default() -> Self {
        Self { max_lines: 1000 }
    }
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1500,
            jitter_ms: 250,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub typing: TypingConfig,
    pub scrollback: ScrollbackConfig,
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            typing: TypingConfig::default(),
            scrollback: ScrollbackConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    pub const DEFAULT_SERVER_URL: &'static str = "ws://127.0.0.1:8080/ws";

    /// Loads the config from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads the config from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Parses and validates the configured server URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or not a WebSocket URL.
    pub fn server_url(&self) -> Result<Url> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("Invalid server_url: {}", self.server_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!(
                "server_url must use ws:// or wss:// (got {})",
                self.server_url
            );
        }
        Ok(url)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.server_url()?;
        if self.scrollback.max_lines == 0 {
            bail!("scrollback.max_lines must be at least 1");
        }
        Ok(())
    }
}

pub mod paths {
    //! Path resolution for env0 configuration and data directories.
    //!
    //! `ENV0_HOME` resolution order:
    //! 1. `ENV0_HOME` environment variable (if set)
    //! 2. ~/.config/env0 (default)

    use std::path::PathBuf;

    /// Returns the env0 home directory.
    pub fn env0_home() -> PathBuf {
        if let Ok(home) = std::env::var("ENV0_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("env0")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        env0_home().join("config.toml")
    }

    /// Returns the directory that holds log files.
    pub fn logs_dir() -> PathBuf {
        env0_home().join("logs")
    }
}

/// Resolves the config path from an optional CLI override.
pub fn resolve_path(override_path: Option<&Path>) -> PathBuf {
    override_path.map_or_else(paths::config_path, Path::to_path_buf)
}
