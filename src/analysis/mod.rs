//! Deterministic text analysis for conversation memory.
//!
//! Everything here is a bag-of-tokens heuristic: text is split on a fixed
//! punctuation/whitespace set, keywords and topics are ranked by frequency,
//! and sentiment is a weighted lexicon walk with simple modifier rules.
//! Nothing here calls out to a model, and every function is total.
//!
//! # Example
//!
//! ```
//! use kaachan::analysis::{EmotionalContext, TextAnalysisEngine};
//!
//! let engine = TextAnalysisEngine::new();
//! let result = engine.analyze("とても嬉しい");
//! assert!(result.sentiment > 0.5);
//! assert_eq!(result.emotional_context, EmotionalContext::VeryPositive);
//! ```

pub mod lexicon;

pub use lexicon::{Lexicon, WeightedWord};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// Maximum number of keywords kept per analysis.
pub const MAX_KEYWORDS: usize = 5;

/// Maximum number of topics kept per analysis.
pub const MAX_TOPICS: usize = 3;

const SEPARATORS: &[char] = &[
    '、', '。', '，', '．', '！', '？', '!', '?', ',', '.', ';', ':', '；', '：', '「', '」', '『',
    '』', '(', ')', '（', '）', '…',
];

/// Discretized sentiment bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalContext {
    VeryNegative,
    Negative,
    #[default]
    Neutral,
    Positive,
    VeryPositive,
}

impl EmotionalContext {
    /// Buckets a score. Thresholds are strict, so exactly 0.5 is `Positive`.
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            EmotionalContext::VeryPositive
        } else if score > 0.2 {
            EmotionalContext::Positive
        } else if score < -0.5 {
            EmotionalContext::VeryNegative
        } else if score < -0.2 {
            EmotionalContext::Negative
        } else {
            EmotionalContext::Neutral
        }
    }

    /// Ordinal position from most negative (-2) to most positive (2).
    pub fn rank(&self) -> i8 {
        match self {
            EmotionalContext::VeryNegative => -2,
            EmotionalContext::Negative => -1,
            EmotionalContext::Neutral => 0,
            EmotionalContext::Positive => 1,
            EmotionalContext::VeryPositive => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalContext::VeryNegative => "very_negative",
            EmotionalContext::Negative => "negative",
            EmotionalContext::Neutral => "neutral",
            EmotionalContext::Positive => "positive",
            EmotionalContext::VeryPositive => "very_positive",
        }
    }
}

impl fmt::Display for EmotionalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals derived from a single piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub emotional_context: EmotionalContext,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TextAnalysisEngine {
    lexicon: Lexicon,
}

impl TextAnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Splits on whitespace and the fixed punctuation set, dropping empties.
    /// Runs of separators collapse, so redundant punctuation never changes
    /// the token sequence.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Top tokens by frequency after dropping function words; ties keep
    /// first-occurrence order.
    pub fn extract_keywords(&self, tokens: &[String]) -> Vec<String> {
        rank_by_frequency(
            tokens
                .iter()
                .filter(|token| !self.lexicon.is_function_word(token)),
            MAX_KEYWORDS,
        )
    }

    /// Top content tokens (more than one character, not a stopword) by frequency.
    pub fn extract_topics(&self, tokens: &[String]) -> Vec<String> {
        rank_by_frequency(
            tokens.iter().filter(|token| {
                token.chars().count() > 1
                    && !self.lexicon.is_function_word(token)
                    && !self.lexicon.is_content_stopword(token)
            }),
            MAX_TOPICS,
        )
    }

    /// Length-normalized sentiment in `[-1, 1]`.
    pub fn score_sentiment(&self, tokens: &[String]) -> f64 {
        normalize(self.raw_sentiment(tokens), tokens.len())
    }

    /// Scores several token runs as one body of text without letting a
    /// modifier at the end of one run affect the start of the next.
    pub fn score_segments(&self, segments: &[Vec<String>]) -> f64 {
        let total_tokens = segments.iter().map(Vec::len).sum();
        let sum = segments
            .iter()
            .map(|tokens| self.raw_sentiment(tokens))
            .sum();
        normalize(sum, total_tokens)
    }

    pub fn classify_emotion(&self, score: f64) -> EmotionalContext {
        EmotionalContext::from_score(score)
    }

    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let tokens = self.tokenize(text);
        let sentiment = self.score_sentiment(&tokens);
        AnalysisResult {
            keywords: self.extract_keywords(&tokens),
            topics: self.extract_topics(&tokens),
            emotional_context: self.classify_emotion(sentiment),
            sentiment,
        }
    }

    fn raw_sentiment(&self, tokens: &[String]) -> f64 {
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let weight = self.lexicon.weight(token);
            if weight == 0.0 {
                continue;
            }

            let mut multiplier = 1.0;
            if let Some(prev) = i.checked_sub(1).map(|p| tokens[p].as_str()) {
                if self.lexicon.is_intensifier(prev) {
                    multiplier = 1.5;
                } else if self.lexicon.is_diminisher(prev) {
                    multiplier = 0.5;
                }
            }
            if let Some(next) = tokens.get(i + 1) {
                if self.lexicon.is_negator(next) {
                    multiplier *= -1.0;
                }
            }

            sum += weight * multiplier;
        }

        sum
    }
}

fn normalize(sum: f64, token_count: usize) -> f64 {
    let divisor = (token_count as f64 / 10.0).max(1.0);
    let score = sum / divisor;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    }
}

/// Distinct tokens ordered by descending count. The sort is stable and the
/// tally preserves insertion order, so ties resolve to first occurrence.
fn rank_by_frequency<'a>(tokens: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut tally: Vec<(&'a str, usize)> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for token in tokens {
        match positions.get(token.as_str()) {
            Some(&idx) => tally[idx].1 += 1,
            None => {
                positions.insert(token.as_str(), tally.len());
                tally.push((token.as_str(), 1));
            }
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
        .into_iter()
        .take(limit)
        .map(|(token, _)| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn toks(engine: &TextAnalysisEngine, text: &str) -> Vec<String> {
        engine.tokenize(text)
    }

    #[test]
    fn test_tokenize_splits_on_punctuation_and_whitespace() {
        let engine = TextAnalysisEngine::new();
        assert_eq!(
            engine.tokenize("今日は、晴れ。 明日は？雨!"),
            vec!["今日は", "晴れ", "明日は", "雨"]
        );
        assert!(engine.tokenize("").is_empty());
        assert!(engine.tokenize("。。、！？  ").is_empty());
    }

    #[test]
    fn test_tokenize_ignores_redundant_punctuation() {
        let engine = TextAnalysisEngine::new();
        let noisy = engine.tokenize("料理、、、 掃除！！！？？ 洗濯。。。");
        let clean = engine.tokenize("料理 掃除 洗濯");
        assert_eq!(noisy, clean);
    }

    #[test]
    fn test_keywords_rank_by_frequency_with_stable_ties() {
        let engine = TextAnalysisEngine::new();
        let tokens = toks(&engine, "b a c a b a d e f g");
        assert_eq!(engine.extract_keywords(&tokens), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_keywords_drop_function_words_and_are_unique() {
        let engine = TextAnalysisEngine::new();
        let tokens = toks(&engine, "は カレー が カレー の 匂い を 消す");
        let keywords = engine.extract_keywords(&tokens);
        assert_eq!(keywords, vec!["カレー", "匂い", "消す"]);
    }

    #[test]
    fn test_topics_skip_short_tokens_and_stopwords() {
        let engine = TextAnalysisEngine::new();
        let tokens = toks(&engine, "掃除 掃除 a 勉強する 洗濯 料理 料理 料理 です");
        assert_eq!(engine.extract_topics(&tokens), vec!["料理", "掃除", "洗濯"]);
    }

    #[test]
    fn test_single_message_with_intensifier_is_very_positive() {
        let engine = TextAnalysisEngine::new();
        let result = engine.analyze("とても嬉しい");
        assert!(result.sentiment > 0.5);
        assert_eq!(result.emotional_context, EmotionalContext::VeryPositive);

        let spaced = engine.analyze("とても 嬉しい");
        assert_eq!(spaced.sentiment, 1.0);
    }

    #[rstest]
    #[case("少し 安心", 0.4)]
    #[case("安心 ない", -0.8)]
    #[case("とても 不安", -1.0)]
    #[case("やや 悲しい", -0.65)]
    #[case("天気 晴れ", 0.0)]
    fn test_modifier_rules(#[case] text: &str, #[case] expected: f64) {
        let engine = TextAnalysisEngine::new();
        let score = engine.score_sentiment(&engine.tokenize(text));
        assert!(
            (score - expected).abs() < 1e-9,
            "{text}: expected {expected}, got {score}"
        );
    }

    #[test]
    fn test_sentiment_is_normalized_by_length() {
        let engine = TextAnalysisEngine::new();
        let mut text = "嬉しい".to_string();
        for i in 0..19 {
            text.push_str(&format!(" 単語{}", i));
        }
        let score = engine.score_sentiment(&engine.tokenize(&text));
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_sentiment_always_in_bounds() {
        let engine = TextAnalysisEngine::new();
        let samples = [
            "素晴らしい 素晴らしい 素晴らしい 素晴らしい",
            "酷い 酷い 酷い 怒り 怒り",
            "とても 酷い ない とても 素晴らしい ません",
            "",
            "🙂🙂🙂",
        ];
        for sample in samples {
            let score = engine.score_sentiment(&engine.tokenize(sample));
            assert!((-1.0..=1.0).contains(&score), "{sample} -> {score}");
        }
    }

    #[test]
    fn test_segments_do_not_leak_modifiers_across_messages() {
        let engine = TextAnalysisEngine::new();
        let segments = vec![engine.tokenize("とても"), engine.tokenize("安心")];
        // 0.8 unmodified; a joined token stream would have given 1.2.
        assert!((engine.score_segments(&segments) - 0.8).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.51, EmotionalContext::VeryPositive)]
    #[case(0.5, EmotionalContext::Positive)]
    #[case(0.21, EmotionalContext::Positive)]
    #[case(0.2, EmotionalContext::Neutral)]
    #[case(0.0, EmotionalContext::Neutral)]
    #[case(-0.2, EmotionalContext::Neutral)]
    #[case(-0.21, EmotionalContext::Negative)]
    #[case(-0.5, EmotionalContext::Negative)]
    #[case(-0.51, EmotionalContext::VeryNegative)]
    fn test_classify_thresholds(#[case] score: f64, #[case] expected: EmotionalContext) {
        assert_eq!(EmotionalContext::from_score(score), expected);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let scores: Vec<f64> = (-100..=100).map(|i| i as f64 / 100.0).collect();
        for pair in scores.windows(2) {
            let lower = EmotionalContext::from_score(pair[0]).rank();
            let higher = EmotionalContext::from_score(pair[1]).rank();
            assert!(lower <= higher, "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_unseen_text_is_neutral() {
        let engine = TextAnalysisEngine::new();
        let result = engine.analyze("The quick brown fox");
        assert_eq!(result.sentiment, 0.0);
        assert_eq!(result.emotional_context, EmotionalContext::Neutral);
    }
}
