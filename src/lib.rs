//! # Kaachan - persona-driven conversation server
//!
//! Kaachan keeps a bounded, summarized memory of each conversation, derives
//! lightweight signals (keywords, topics, sentiment) from message text with
//! deterministic heuristics, and assembles persona-specific prompts for an
//! external text generation model.
//!
//! ## Overview
//!
//! Kaachan can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `kaachan-server` binary
//! 2. **As a library** - Embed the engine in your own Rust project
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use kaachan::{
//!     GenerationParams, OrchestratorSettings, Provider, ResponseOrchestrator,
//!     SessionSettings, SessionStore, Persona,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::Gemini {
//!         api_key: std::env::var("GEMINI_API_KEY")?,
//!         base_url: kaachan::llm::gemini::DEFAULT_BASE_URL.to_string(),
//!         model: "gemini-1.5-flash".to_string(),
//!         params: GenerationParams::default(),
//!     };
//!     let store = Arc::new(SessionStore::in_memory(SessionSettings::default()));
//!     let orchestrator = ResponseOrchestrator::new(
//!         provider.create_client().await?,
//!         store,
//!         OrchestratorSettings::default(),
//!     );
//!
//!     let session = orchestrator.create_session(Persona::Caring, None, true).await?;
//!     let outcome = orchestrator
//!         .generate_response(&session.session_id, "洗濯の黄ばみはどうやったら取れる？")
//!         .await?;
//!     println!("{}", outcome.response);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`analysis`] - Tokenizer, keyword/topic extraction, sentiment scoring
//! - [`memory`] - Conversation summary and context manager
//! - [`persona`] - Persona prompts, switching and re-priming
//! - [`session`] - Session records, TTL and storage backends
//! - [`orchestrator`] - Per-message control flow
//! - [`llm`] - Generation clients (Gemini, Ollama)
//! - [`api`] - REST API handlers and routes
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Deterministic text analysis.
pub mod analysis;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Generation clients and provider selection.
pub mod llm;
/// Conversation summary and context management.
pub mod memory;
/// Per-message orchestration.
pub mod orchestrator;
/// Persona templates, switching and re-priming.
pub mod persona;
/// Session records and persistence.
pub mod session;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use analysis::{AnalysisResult, EmotionalContext, TextAnalysisEngine};
pub use llm::{GenerationClient, GenerationError, GenerationParams, Provider};
pub use memory::{ConversationContextManager, ConversationSummary};
pub use orchestrator::{GenerationOutcome, OrchestratorSettings, ResponseOrchestrator};
pub use persona::PersonaPromptBuilder;
pub use session::{Session, SessionSettings, SessionStore};
pub use types::{AppError, Message, MessageRole, Persona, Result};
pub use utils::toml_config::KaachanConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<KaachanConfig>,
    /// Conversation engine
    pub orchestrator: Arc<ResponseOrchestrator>,
}

impl AppState {
    /// Builds the session store and generation client described by `config`.
    pub async fn from_config(config: KaachanConfig) -> Result<Self> {
        let store = build_store(&config)?;
        let client = Provider::from_config(&config.llm)?.create_client().await?;
        let orchestrator = ResponseOrchestrator::new(
            client,
            Arc::new(store),
            config.conversation.orchestrator_settings(),
        );

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        })
    }
}

fn build_store(config: &KaachanConfig) -> Result<SessionStore> {
    use utils::toml_config::StorageConfig;

    let settings = config.conversation.session_settings();
    match &config.storage {
        StorageConfig::Memory => Ok(SessionStore::in_memory(settings)),
        StorageConfig::File { path } => {
            let backend = session::FileStore::open(path).map_err(|e| {
                AppError::Storage(format!(
                    "cannot open session directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(SessionStore::new(Arc::new(backend), settings))
        }
    }
}
