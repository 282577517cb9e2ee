//! Conversation memory: the rolling summary kept alongside a session.
//!
//! This module provides:
//! - The persisted [`ConversationSummary`] and [`AssistantResponseAnalysis`] records
//! - History windowing helpers
//! - [`ConversationContextManager`], which keeps the summary in step with the
//!   transcript and renders it as a prompt digest

pub mod context_manager;

pub use context_manager::{ConversationContextManager, LastExchange};

use crate::analysis::EmotionalContext;
use crate::types::Message;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default number of recent messages the summary is computed over.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Maximum key points, topics and follow-ups kept for one assistant reply.
pub const MAX_REPLY_ITEMS: usize = 3;

/// What an assistant reply was mainly doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseIntent {
    QuestionAnswer,
    Caution,
    Advice,
    #[default]
    General,
}

impl ResponseIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseIntent::QuestionAnswer => "question_answer",
            ResponseIntent::Caution => "caution",
            ResponseIntent::Advice => "advice",
            ResponseIntent::General => "general",
        }
    }

    /// Japanese label used in prompt digests.
    pub fn label(&self) -> &'static str {
        match self {
            ResponseIntent::QuestionAnswer => "質問への回答",
            ResponseIntent::Caution => "注意喚起",
            ResponseIntent::Advice => "アドバイス",
            ResponseIntent::General => "一般的な会話",
        }
    }
}

/// Structured reading of the latest assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssistantResponseAnalysis {
    pub content: String,
    pub intent: ResponseIntent,
    pub key_points: Vec<String>,
    pub topics: Vec<String>,
    pub sentiment_label: EmotionalContext,
    pub follow_up_suggestions: Vec<String>,
}

/// Derived state over the most recent context window.
///
/// `keywords` holds at most five distinct entries, `topics` at most three, and
/// `sentiment_score` is always within `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummary {
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub emotional_context: EmotionalContext,
    pub sentiment_score: f64,
    /// Timestamp of the newest message the summary was computed from.
    #[serde(default)]
    pub last_timestamp: Option<i64>,
    #[serde(default)]
    pub last_assistant_analysis: Option<AssistantResponseAnalysis>,
}

impl Default for ConversationSummary {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            topics: Vec::new(),
            emotional_context: EmotionalContext::Neutral,
            sentiment_score: 0.0,
            last_timestamp: None,
            last_assistant_analysis: None,
        }
    }
}

impl ConversationSummary {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.topics.is_empty()
            && self.last_timestamp.is_none()
            && self.last_assistant_analysis.is_none()
    }
}

/// Returns the trailing `window_size` messages of `history`.
pub fn recent_window(history: &[Message], window_size: usize) -> &[Message] {
    let start = history.len().saturating_sub(window_size);
    &history[start..]
}
