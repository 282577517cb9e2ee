//! Word lists driving the sentiment and stopword heuristics.

use serde::{Deserialize, Serialize};

/// A lexicon entry. Matching is by substring so inflected or compound
/// tokens ("嬉しいです") still hit the base word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedWord {
    pub word: String,
    pub weight: f64,
}

impl WeightedWord {
    fn new(word: &str, weight: f64) -> Self {
        Self {
            word: word.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    pub positive: Vec<WeightedWord>,
    pub negative: Vec<WeightedWord>,
    /// Exact-match tokens that scale the following sentiment word by 1.5.
    pub intensifiers: Vec<String>,
    /// Exact-match tokens that scale the following sentiment word by 0.5.
    pub diminishers: Vec<String>,
    /// Substrings that flip the preceding sentiment word.
    pub negators: Vec<String>,
    /// Particles dropped before keyword and topic extraction.
    pub function_words: Vec<String>,
    /// Substrings that disqualify a token from being a topic.
    pub content_stopwords: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Lexicon {
    /// The built-in Japanese lexicon.
    pub fn japanese() -> Self {
        Self {
            positive: vec![
                WeightedWord::new("良い", 1.0),
                WeightedWord::new("嬉しい", 1.2),
                WeightedWord::new("楽しい", 1.2),
                WeightedWord::new("好き", 1.0),
                WeightedWord::new("素晴らしい", 1.5),
                WeightedWord::new("安心", 0.8),
                WeightedWord::new("幸せ", 1.3),
                WeightedWord::new("希望", 0.9),
            ],
            negative: vec![
                WeightedWord::new("悪い", -1.0),
                WeightedWord::new("辛い", -1.2),
                WeightedWord::new("苦しい", -1.2),
                WeightedWord::new("嫌い", -1.0),
                WeightedWord::new("酷い", -1.5),
                WeightedWord::new("不安", -0.8),
                WeightedWord::new("悲しい", -1.3),
                WeightedWord::new("怒り", -1.4),
            ],
            intensifiers: words(&["とても", "すごく", "本当に", "非常に"]),
            diminishers: words(&["少し", "やや", "ちょっと", "多少"]),
            negators: words(&["ない", "ません", "無い", "不"]),
            function_words: words(&["は", "が", "の", "に", "と", "で", "を", "な", "も", "や"]),
            content_stopwords: words(&["です", "ます", "した", "する", "ある", "いる", "なる"]),
        }
    }

    /// Weight of the first positive, then negative, entry contained in `token`;
    /// zero when nothing matches.
    pub fn weight(&self, token: &str) -> f64 {
        self.positive
            .iter()
            .chain(self.negative.iter())
            .find(|entry| token.contains(entry.word.as_str()))
            .map(|entry| entry.weight)
            .unwrap_or(0.0)
    }

    pub fn is_intensifier(&self, token: &str) -> bool {
        self.intensifiers.iter().any(|w| w == token)
    }

    pub fn is_diminisher(&self, token: &str) -> bool {
        self.diminishers.iter().any(|w| w == token)
    }

    pub fn is_negator(&self, token: &str) -> bool {
        self.negators.iter().any(|n| token.contains(n.as_str()))
    }

    pub fn is_function_word(&self, token: &str) -> bool {
        self.function_words.iter().any(|w| w == token)
    }

    pub fn is_content_stopword(&self, token: &str) -> bool {
        self.content_stopwords
            .iter()
            .any(|w| token.contains(w.as_str()))
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::japanese()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_matches_substring() {
        let lexicon = Lexicon::japanese();
        assert_eq!(lexicon.weight("嬉しいです"), 1.2);
        assert_eq!(lexicon.weight("悲しい"), -1.3);
        assert_eq!(lexicon.weight("天気"), 0.0);
    }

    #[test]
    fn test_modifiers_are_exact_but_negators_are_substrings() {
        let lexicon = Lexicon::japanese();
        assert!(lexicon.is_intensifier("とても"));
        assert!(!lexicon.is_intensifier("とてもとても"));
        assert!(lexicon.is_negator("じゃない"));
        assert!(lexicon.is_content_stopword("勉強する"));
    }
}
