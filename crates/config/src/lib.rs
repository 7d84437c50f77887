//! Configuration loading, validation, and management for PatchChat.
//!
//! Loads configuration from `~/.patchchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.patchchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model API key (usually supplied via environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to request from the gateway
    #[serde(default = "default_model")]
    pub model: String,

    /// System preamble prepended to every user prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// HTTP/WebSocket server configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Turn decomposition configuration
    #[serde(default)]
    pub turn: TurnConfig,
}

fn default_model() -> String {
    "gemini-1.5-pro".into()
}

fn default_system_prompt() -> String {
    "You're a helpful assistant. When the user asks for a document, email, \
     report, or weather, call the matching tool instead of describing it."
        .into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("gateway", &self.gateway)
            .field("turn", &self.turn)
            .finish()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory generated files (PDFs, snippets) are written to and
    /// served from under `/downloads`
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}
fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

/// Turn decomposition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Emit a provisional output message before a tool resolves
    #[serde(default = "default_true")]
    pub placeholder_enabled: bool,

    /// The provisional text
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,

    /// What to do when the model names a tool that is not registered:
    /// "silent" skips it, "error" surfaces an error-shaped output
    #[serde(default = "default_unknown_tool")]
    pub unknown_tool: String,

    /// Execute tool calls one at a time in part order instead of
    /// concurrently
    #[serde(default)]
    pub sequential_tools: bool,
}

fn default_true() -> bool {
    true
}
fn default_placeholder_text() -> String {
    "Working on it…".into()
}
fn default_unknown_tool() -> String {
    "silent".into()
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            placeholder_enabled: true,
            placeholder_text: default_placeholder_text(),
            unknown_tool: default_unknown_tool(),
            sequential_tools: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Cannot parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl AppConfig {
    /// Load configuration from the default path (~/.patchchat/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `PATCHCHAT_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("PATCHCHAT_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("PATCHCHAT_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".patchchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        match self.turn.unknown_tool.as_str() {
            "silent" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "turn.unknown_tool must be 'silent' or 'error', got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            system_prompt: default_system_prompt(),
            gateway: GatewayConfig::default(),
            turn: TurnConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}
