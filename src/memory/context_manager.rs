use super::{recent_window, AssistantResponseAnalysis, ConversationSummary, DEFAULT_HISTORY_WINDOW};
use crate::analysis::TextAnalysisEngine;
use crate::types::{Message, MessageRole};

/// Verbatim copy of the newest user and assistant turns in the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastExchange {
    pub user: Option<String>,
    pub assistant: Option<String>,
}

/// Keeps a [`ConversationSummary`] consistent with a growing transcript.
///
/// The manager is rebuilt per request from the persisted summary, so it holds
/// no state that outlives a session record.
pub struct ConversationContextManager {
    engine: TextAnalysisEngine,
    window: usize,
    summary: ConversationSummary,
    last_exchange: LastExchange,
}

impl ConversationContextManager {
    pub fn new(engine: TextAnalysisEngine, window: usize) -> Self {
        Self::with_summary(engine, window, ConversationSummary::default())
    }

    /// Resumes from a previously persisted summary.
    pub fn with_summary(
        engine: TextAnalysisEngine,
        window: usize,
        summary: ConversationSummary,
    ) -> Self {
        Self {
            engine,
            window: window.max(1),
            summary,
            last_exchange: LastExchange::default(),
        }
    }

    /// Recomputes keywords, topics and sentiment over the trailing window of
    /// `history`. An empty history resets the summary to its defaults.
    pub fn update_context(&mut self, history: &[Message]) -> &ConversationSummary {
        let window = recent_window(history, self.window);

        let Some(newest) = window.last() else {
            self.summary = ConversationSummary::default();
            self.last_exchange = LastExchange::default();
            return &self.summary;
        };

        let segments: Vec<Vec<String>> = window
            .iter()
            .map(|m| self.engine.tokenize(&m.content))
            .collect();
        let tokens: Vec<String> = segments.iter().flatten().cloned().collect();
        let sentiment = self.engine.score_segments(&segments);

        self.summary.keywords = self.engine.extract_keywords(&tokens);
        self.summary.topics = self.engine.extract_topics(&tokens);
        self.summary.sentiment_score = sentiment;
        self.summary.emotional_context = self.engine.classify_emotion(sentiment);
        self.summary.last_timestamp = Some(newest.timestamp);

        self.last_exchange = LastExchange {
            user: latest_content(window, MessageRole::User),
            assistant: latest_content(window, MessageRole::Assistant),
        };

        tracing::trace!(
            window = window.len(),
            sentiment,
            emotion = %self.summary.emotional_context,
            "Context updated"
        );

        &self.summary
    }

    pub fn record_assistant_analysis(&mut self, analysis: AssistantResponseAnalysis) {
        self.last_exchange.assistant = Some(analysis.content.clone());
        self.summary.last_assistant_analysis = Some(analysis);
    }

    /// Renders the summary as a short Japanese digest placed ahead of the
    /// transcript. Returns an empty string when there is nothing to say.
    pub fn summarize_for_prompt(&self) -> String {
        let mut lines = Vec::new();

        if self.last_exchange.user.is_some() || self.last_exchange.assistant.is_some() {
            lines.push("直近のやり取り:".to_string());
            if let Some(user) = &self.last_exchange.user {
                lines.push(format!("  ユーザー: {}", user));
            }
            if let Some(assistant) = &self.last_exchange.assistant {
                lines.push(format!("  AI: {}", assistant));
            }
        }

        if !self.summary.keywords.is_empty() {
            lines.push(format!("キーワード: {}", self.summary.keywords.join("、")));
        }
        if !self.summary.topics.is_empty() {
            lines.push(format!("話題: {}", self.summary.topics.join("、")));
        }
        if self.summary.last_timestamp.is_some() {
            lines.push(format!(
                "感情の傾向: {} ({:.2})",
                self.summary.emotional_context, self.summary.sentiment_score
            ));
        }

        if let Some(analysis) = &self.summary.last_assistant_analysis {
            let mut line = format!("前回の応答: {}", analysis.intent.label());
            if !analysis.key_points.is_empty() {
                line.push_str(&format!(" / 要点: {}", analysis.key_points.join("、")));
            }
            if !analysis.follow_up_suggestions.is_empty() {
                line.push_str(&format!(
                    " / 提案: {}",
                    analysis.follow_up_suggestions.join("、")
                ));
            }
            lines.push(line);
        }

        if lines.is_empty() {
            return String::new();
        }

        format!("【会話の要約】\n{}", lines.join("\n"))
    }

    pub fn summary(&self) -> &ConversationSummary {
        &self.summary
    }

    pub fn into_summary(self) -> ConversationSummary {
        self.summary
    }

    pub fn last_exchange(&self) -> &LastExchange {
        &self.last_exchange
    }
}

impl Default for ConversationContextManager {
    fn default() -> Self {
        Self::new(TextAnalysisEngine::default(), DEFAULT_HISTORY_WINDOW)
    }
}

fn latest_content(window: &[Message], role: MessageRole) -> Option<String> {
    window
        .iter()
        .rev()
        .find(|m| m.role == role)
        .map(|m| m.content.clone())
}
