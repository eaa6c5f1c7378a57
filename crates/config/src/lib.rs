//! Configuration loading, validation, and management for Inkwell.
//!
//! Loads configuration from `~/.inkwell/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.inkwell/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Client API key used in `stored` key mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// How requests obtain a credential
    #[serde(default)]
    pub key_mode: KeyMode,

    /// Default model identifier
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Directory of markdown notes used by the CLI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_dir: Option<PathBuf>,

    /// Size limits for prompt assembly and chat history
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Lore auto-creation settings
    #[serde(default)]
    pub lore: LoreConfig,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.7
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
            .field("key_mode", &self.key_mode)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("limits", &self.limits)
            .field("lore", &self.lore)
            .field("notes_dir", &self.notes_dir)
            .finish()
    }
}

/// Credential routing mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// No client credential is sent; the server's key is used.
    #[default]
    ServerDefault,
    /// Use the saved credential directly.
    Stored,
    /// Ask the user for a credential before each request.
    Prompt,
}

impl std::str::FromStr for KeyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server_default" | "server" => Ok(Self::ServerDefault),
            "stored" => Ok(Self::Stored),
            "prompt" => Ok(Self::Prompt),
            other => Err(ConfigError::ValidationError(format!(
                "unknown key mode '{other}' (expected server_default, stored or prompt)"
            ))),
        }
    }
}

/// Per-source character caps and history bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Hard ceiling on the raw instruction, in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// How many corpus items the automatic sample may include
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Per-item cap for the automatic sample, in characters
    #[serde(default = "default_sample_char_cap")]
    pub sample_char_cap: usize,

    /// Per-item cap for explicitly selected references, in characters
    #[serde(default = "default_reference_char_cap")]
    pub reference_char_cap: usize,

    /// Maximum user/model exchanges kept in chat history
    #[serde(default = "default_max_exchanges")]
    pub max_exchanges: usize,
}

fn default_max_input_chars() -> usize {
    12_000
}
fn default_sample_count() -> usize {
    5
}
fn default_sample_char_cap() -> usize {
    600
}
fn default_reference_char_cap() -> usize {
    2_000
}
fn default_max_exchanges() -> usize {
    10
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            sample_count: default_sample_count(),
            sample_char_cap: default_sample_char_cap(),
            reference_char_cap: default_reference_char_cap(),
            max_exchanges: default_max_exchanges(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreConfig {
    /// Create lore entries for notations that match nothing yet
    #[serde(default = "default_true")]
    pub auto_create: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self { auto_create: true }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.inkwell/config.toml).
    ///
    /// Environment overrides:
    /// - `INKWELL_API_KEY` (only when the file has no key)
    /// - `INKWELL_MODEL`
    /// - `INKWELL_KEY_MODE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("INKWELL_API_KEY").ok();
        }

        if let Ok(model) = std::env::var("INKWELL_MODEL") {
            config.default_model = model;
        }

        if let Ok(mode) = std::env::var("INKWELL_KEY_MODE") {
            config.key_mode = mode.parse()?;
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
        dirs_home().join(".inkwell")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let limits = &self.limits;
        if limits.max_input_chars == 0 || limits.sample_char_cap == 0 {
            return Err(ConfigError::ValidationError(
                "max_input_chars and sample_char_cap must be > 0".into(),
            ));
        }
        if limits.reference_char_cap < limits.sample_char_cap {
            return Err(ConfigError::ValidationError(
                "reference_char_cap must be >= sample_char_cap".into(),
            ));
        }
        if limits.max_exchanges == 0 {
            return Err(ConfigError::ValidationError(
                "max_exchanges must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if a stored API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            key_mode: KeyMode::default(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            limits: LimitsConfig::default(),
            lore: LoreConfig::default(),
            notes_dir: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
