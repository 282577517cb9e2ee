//! Generation client abstraction and provider selection
//!
//! A [`GenerationClient`] is a stateful chat backend: each conversation
//! session maps to an external chat history that can be reset with a new
//! system prompt and re-primed turn by turn.
//! - **Gemini**: REST `generateContent` over reqwest (always available)
//! - **Ollama**: local inference via `ollama-rs` (feature `ollama`)

use crate::types::{AppError, Message, Result};
use crate::utils::toml_config::LlmConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Failure categories reported by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Best-effort classification of a free-form provider error message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("rate limit") || lower.contains("quota") || lower.contains("429") {
            GenerationError::RateLimit(message)
        } else if lower.contains("context length")
            || lower.contains("token limit")
            || lower.contains("too long")
        {
            GenerationError::ContextLengthExceeded(message)
        } else if lower.contains("empty response") {
            GenerationError::EmptyResponse
        } else if lower.contains("invalid") {
            GenerationError::InvalidInput(message)
        } else {
            GenerationError::Other(message)
        }
    }
}

/// Stateful generation backend.
///
/// Implementations keep one chat history per `session_id`. A session that was
/// never reset starts with an empty history.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends `prompt` as the next user turn and returns the reply text.
    async fn generate(&self, session_id: &str, prompt: &str)
        -> std::result::Result<String, GenerationError>;

    /// Discards the session's history and seeds it with `system_prompt`.
    async fn reset_session(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> std::result::Result<(), GenerationError>;

    /// Appends a prior turn to the session's history without generating.
    async fn replay_turn(
        &self,
        session_id: &str,
        turn: &Message,
    ) -> std::result::Result<(), GenerationError>;

    /// Drops any state held for the session.
    async fn end_session(&self, _session_id: &str) {}

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

// ============================================================================
// Per-session chat histories
// ============================================================================

struct ChatHistory<T> {
    seed: Vec<T>,
    turns: VecDeque<T>,
}

impl<T> Default for ChatHistory<T> {
    fn default() -> Self {
        Self {
            seed: Vec::new(),
            turns: VecDeque::new(),
        }
    }
}

/// Bounded chat histories keyed by session id, shared by the concrete clients.
///
/// The seed (system prompt) is kept separately and never evicted; at most
/// `max_turns` conversational turns are retained after it.
pub struct SessionHistories<T> {
    inner: Mutex<HashMap<String, ChatHistory<T>>>,
    max_turns: usize,
}

impl<T: Clone> SessionHistories<T> {
    pub fn new(max_turns: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            max_turns: max_turns.max(2),
        }
    }

    pub fn reset(&self, session_id: &str, seed: Vec<T>) {
        self.inner.lock().insert(
            session_id.to_string(),
            ChatHistory {
                seed,
                turns: VecDeque::new(),
            },
        );
    }

    /// Seed followed by retained turns, oldest first.
    pub fn snapshot(&self, session_id: &str) -> Vec<T> {
        self.inner
            .lock()
            .get(session_id)
            .map(|h| h.seed.iter().chain(h.turns.iter()).cloned().collect())
            .unwrap_or_default()
    }

    /// Appends turns, evicting the oldest beyond the budget.
    pub fn push(&self, session_id: &str, items: impl IntoIterator<Item = T>) {
        let mut guard = self.inner.lock();
        let history = guard.entry(session_id.to_string()).or_default();
        history.turns.extend(items);
        while history.turns.len() > self.max_turns {
            history.turns.pop_front();
        }
    }

    /// Appends one turn only if the budget has room. Returns whether it was kept.
    pub fn try_push(&self, session_id: &str, item: T) -> bool {
        let mut guard = self.inner.lock();
        let history = guard.entry(session_id.to_string()).or_default();
        if history.turns.len() >= self.max_turns {
            return false;
        }
        history.turns.push_back(item);
        true
    }

    pub fn remove(&self, session_id: &str) {
        self.inner.lock().remove(session_id);
    }

    pub fn turn_count(&self, session_id: &str) -> usize {
        self.inner
            .lock()
            .get(session_id)
            .map_or(0, |h| h.turns.len())
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

// ============================================================================
// Provider selection
// ============================================================================

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1000,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini `generateContent` REST API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: "...".to_string(),
    ///     base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-1.5-flash".to_string(),
    ///     params: GenerationParams::default(),
    /// };
    /// ```
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
        params: GenerationParams,
    },

    /// Ollama local LLM provider (requires the `ollama` feature)
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolves a provider from configuration, reading secrets from the
    /// environment variables the config names.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config {
            LlmConfig::Gemini {
                api_key_env,
                model,
                base_url,
                temperature,
                top_p,
                top_k,
                max_output_tokens,
            } => {
                let api_key = std::env::var(api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Config(format!(
                            "Environment variable '{}' is not set",
                            api_key_env
                        ))
                    })?;

                Ok(Provider::Gemini {
                    api_key,
                    base_url: base_url.clone(),
                    model: model.clone(),
                    params: GenerationParams {
                        temperature: *temperature,
                        top_p: *top_p,
                        top_k: *top_k,
                        max_output_tokens: *max_output_tokens,
                    },
                })
            }
            LlmConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's feature is not compiled in or the
    /// underlying HTTP client cannot be built.
    pub async fn create_client(&self) -> Result<Arc<dyn GenerationClient>> {
        match self {
            Provider::Gemini {
                api_key,
                base_url,
                model,
                params,
            } => Ok(Arc::new(super::gemini::GeminiClient::with_base_url(
                api_key.clone(),
                model.clone(),
                *params,
                base_url.clone(),
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(AppError::Config(format!(
                "Ollama provider requested (model '{}') but the 'ollama' feature is not enabled",
                model
            ))),
        }
    }

    /// Check if this provider is compiled into the binary
    pub fn is_available(&self) -> bool {
        match self {
            Provider::Gemini { .. } => true,
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Rate limit exceeded", GenerationError::RateLimit("Rate limit exceeded".into()))]
    #[case("Resource has been exhausted (e.g. check quota).", GenerationError::RateLimit("Resource has been exhausted (e.g. check quota).".into()))]
    #[case("Context length exceeded", GenerationError::ContextLengthExceeded("Context length exceeded".into()))]
    #[case("Invalid argument", GenerationError::InvalidInput("Invalid argument".into()))]
    #[case("empty response", GenerationError::EmptyResponse)]
    #[case("connection reset", GenerationError::Other("connection reset".into()))]
    fn test_classify(#[case] message: &str, #[case] expected: GenerationError) {
        assert_eq!(GenerationError::classify(message), expected);
    }

    #[test]
    fn test_histories_keep_seed_and_cap_turns() {
        let histories = SessionHistories::new(3);
        histories.reset("s", vec!["system"]);
        histories.push("s", ["a", "b", "c", "d"]);

        assert_eq!(histories.snapshot("s"), vec!["system", "b", "c", "d"]);
        assert!(!histories.try_push("s", "e"));
        assert_eq!(histories.turn_count("s"), 3);
    }

    #[test]
    fn test_histories_unknown_session_is_empty() {
        let histories: SessionHistories<String> = SessionHistories::new(10);
        assert!(histories.snapshot("missing").is_empty());
        assert!(histories.try_push("missing", "first".to_string()));
        histories.remove("missing");
        assert_eq!(histories.turn_count("missing"), 0);
    }

    #[test]
    fn test_provider_availability() {
        let gemini = Provider::Gemini {
            api_key: "k".to_string(),
            base_url: "http://localhost".to_string(),
            model: "gemini-1.5-flash".to_string(),
            params: GenerationParams::default(),
        };
        assert!(gemini.is_available());
        assert_eq!(gemini.name(), "Gemini");

        let ollama = Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        };
        assert_eq!(ollama.is_available(), cfg!(feature = "ollama"));
    }

    #[test]
    fn test_from_config_requires_api_key_env() {
        let config = LlmConfig::Gemini {
            api_key_env: "KAACHAN_TEST_UNSET_GEMINI_KEY".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "http://localhost".to_string(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 1000,
        };
        let err = Provider::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("KAACHAN_TEST_UNSET_GEMINI_KEY"));
    }
}
