//! Generation backends
//!
//! The rest of the application talks to an external text model only through
//! [`GenerationClient`]. Concrete clients keep a chat history per session so
//! a persona switch can reset and re-prime it.
//!
//! # Supported Providers
//!
//! - Gemini REST API (always compiled)
//! - `ollama` - Local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use kaachan::llm::{GenerationParams, Provider};
//!
//! let provider = Provider::Gemini {
//!     api_key: std::env::var("GEMINI_API_KEY")?,
//!     base_url: kaachan::llm::gemini::DEFAULT_BASE_URL.to_string(),
//!     model: "gemini-1.5-flash".to_string(),
//!     params: GenerationParams::default(),
//! };
//! let client = provider.create_client().await?;
//! let reply = client.generate("session-1", "こんにちは").await?;
//! ```

/// Client trait, error kinds and provider selection.
pub mod client;
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{GenerationClient, GenerationError, GenerationParams, Provider, SessionHistories};
pub use gemini::GeminiClient;
