//! TOML-based configuration for Kaachan
//!
//! Everything the server needs is declared in one file (`kaachan.toml`).
//! Secrets are never stored in the file itself: the config names the
//! environment variable that holds them (e.g. `api_key_env = "GEMINI_API_KEY"`).

use crate::orchestrator::OrchestratorSettings;
use crate::session::SessionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from kaachan.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KaachanConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmConfig {
    Gemini {
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default = "default_gemini_base")]
        base_url: String,
        #[serde(default = "default_temperature")]
        temperature: f32,
        #[serde(default = "default_top_p")]
        top_p: f32,
        #[serde(default = "default_top_k")]
        top_k: u32,
        #[serde(default = "default_max_output_tokens")]
        max_output_tokens: u32,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base() -> String {
    crate::llm::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.8
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::Gemini {
            api_key_env: default_api_key_env(),
            model: default_gemini_model(),
            base_url: default_gemini_base(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            LlmConfig::Gemini { .. } => "gemini",
            LlmConfig::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmConfig::Gemini { model, .. } | LlmConfig::Ollama { model, .. } => model,
        }
    }
}

// ============= Conversation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Messages the rolling summary and prompt transcript cover
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,
}

fn default_history_window() -> usize {
    crate::memory::DEFAULT_HISTORY_WINDOW
}

fn default_max_messages() -> usize {
    crate::session::MAX_MESSAGES
}

fn default_session_ttl_hours() -> i64 {
    crate::session::SESSION_TTL_HOURS
}

fn default_max_message_chars() -> usize {
    500
}

fn default_generation_timeout_ms() -> u64 {
    15_000
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            max_messages: default_max_messages(),
            session_ttl_hours: default_session_ttl_hours(),
            max_message_chars: default_max_message_chars(),
            generation_timeout_ms: default_generation_timeout_ms(),
        }
    }
}

impl ConversationConfig {
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            history_window: self.history_window,
            max_messages: self.max_messages,
            max_message_chars: self.max_message_chars,
            generation_timeout: Duration::from_millis(self.generation_timeout_ms),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ttl: chrono::Duration::hours(self.session_ttl_hours),
            max_messages: self.max_messages,
        }
    }
}

// ============= Storage Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
    File {
        #[serde(default = "default_session_dir")]
        path: PathBuf,
    },
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("./data/sessions")
}

// ============= Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl KaachanConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: KaachanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate limits and internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let conv = &self.conversation;

        if conv.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.history_window must be greater than 0".to_string(),
            ));
        }
        if conv.max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.max_messages must be greater than 0".to_string(),
            ));
        }
        if conv.history_window > conv.max_messages {
            return Err(ConfigError::ValidationError(format!(
                "conversation.history_window ({}) cannot exceed max_messages ({})",
                conv.history_window, conv.max_messages
            )));
        }
        if conv.session_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "conversation.session_ttl_hours must be positive".to_string(),
            ));
        }
        if conv.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.max_message_chars must be greater than 0".to_string(),
            ));
        }
        if conv.generation_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.generation_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.llm.model().trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model cannot be empty".to_string(),
            ));
        }
        if let LlmConfig::Gemini {
            temperature, top_p, ..
        } = &self.llm
        {
            if !(0.0..=2.0).contains(temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "llm.temperature must be within 0.0..=2.0, got {}",
                    temperature
                )));
            }
            if !(0.0..=1.0).contains(top_p) {
                return Err(ConfigError::ValidationError(format!(
                    "llm.top_p must be within 0.0..=1.0, got {}",
                    top_p
                )));
            }
        }

        Ok(())
    }

    /// Check that every secret the config references is present in the environment
    pub fn validate_secrets(&self) -> Result<(), ConfigError> {
        match &self.llm {
            LlmConfig::Gemini { api_key_env, .. } => validate_env_var(api_key_env),
            LlmConfig::Ollama { .. } => Ok(()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn validate_env_var(name: &str) -> Result<(), ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}
