use crate::analysis::TextAnalysisEngine;
use crate::memory::{AssistantResponseAnalysis, ResponseIntent, MAX_REPLY_ITEMS};

const CAUTION_MARKERS: &[&str] = &["注意", "気をつけ", "気を付け", "危ない", "危険", "控え", "やめ"];
const ADVICE_MARKERS: &[&str] = &[
    "しましょう",
    "してみ",
    "といい",
    "おすすめ",
    "オススメ",
    "べき",
    "なさい",
    "コツ",
    "ポイント",
];
const BULLETS: &[&str] = &["- ", "* ", "・", "• ", "● "];

/// Reads intent, key points, topics, tone and follow-ups out of a reply.
pub fn analyze_reply(engine: &TextAnalysisEngine, content: &str) -> AssistantResponseAnalysis {
    let analysis = engine.analyze(content);
    let follow_up_suggestions = follow_up_suggestions(content, &analysis.topics);

    AssistantResponseAnalysis {
        content: content.to_string(),
        intent: classify_intent(content),
        key_points: extract_key_points(content),
        topics: analysis.topics,
        sentiment_label: analysis.emotional_context,
        follow_up_suggestions,
    }
}

/// First match wins: question marks, then caution markers, then advice markers.
pub fn classify_intent(content: &str) -> ResponseIntent {
    if content.contains('?') || content.contains('？') {
        ResponseIntent::QuestionAnswer
    } else if CAUTION_MARKERS.iter().any(|m| content.contains(m)) {
        ResponseIntent::Caution
    } else if ADVICE_MARKERS.iter().any(|m| content.contains(m)) {
        ResponseIntent::Advice
    } else {
        ResponseIntent::General
    }
}

/// Bullet or numbered lines, falling back to `**emphasized**` phrases.
pub fn extract_key_points(content: &str) -> Vec<String> {
    let bullets: Vec<String> = content
        .lines()
        .filter_map(strip_list_marker)
        .map(|line| line.replace("**", "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_REPLY_ITEMS)
        .collect();

    if !bullets.is_empty() {
        return bullets;
    }

    content
        .split("**")
        .skip(1)
        .step_by(2)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_REPLY_ITEMS)
        .map(str::to_string)
        .collect()
}

/// Questions the reply asks back, else one prompt per topic.
pub fn follow_up_suggestions(content: &str, topics: &[String]) -> Vec<String> {
    let questions: Vec<String> = content
        .split_inclusive(|c: char| matches!(c, '。' | '！' | '!' | '？' | '?' | '\n'))
        .map(str::trim)
        .filter(|s| s.ends_with('？') || s.ends_with('?'))
        .map(|s| s.replace("**", ""))
        .take(MAX_REPLY_ITEMS)
        .collect();

    if !questions.is_empty() {
        return questions;
    }

    topics
        .iter()
        .take(MAX_REPLY_ITEMS)
        .map(|topic| format!("{}についてもっと教えて", topic))
        .collect()
}

fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if let Some(rest) = BULLETS.iter().find_map(|b| line.strip_prefix(b)) {
        return Some(rest);
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    [". ", ".", ")", "）", "．"]
        .iter()
        .find_map(|m| rest.strip_prefix(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("熱はない？", ResponseIntent::QuestionAnswer)]
    #[case("包丁には気をつけてね。", ResponseIntent::Caution)]
    #[case("重曹を使うといいわよ。", ResponseIntent::Advice)]
    #[case("今日もお疲れさま。", ResponseIntent::General)]
    fn test_classify_intent(#[case] content: &str, #[case] expected: ResponseIntent) {
        assert_eq!(classify_intent(content), expected);
    }

    #[test]
    fn test_key_points_from_bullets_are_capped() {
        let reply = "コツはこれよ:\n- **重曹**を使う\n・酢でふく\n1. 換気する\n2) 乾かす";
        assert_eq!(
            extract_key_points(reply),
            vec!["重曹を使う", "酢でふく", "換気する"]
        );
    }

    #[test]
    fn test_key_points_fall_back_to_emphasis() {
        let reply = "まずは**換気**が大事。それから**掃除**ね。";
        assert_eq!(extract_key_points(reply), vec!["換気", "掃除"]);
        assert!(extract_key_points("普通の文章").is_empty());
    }

    #[test]
    fn test_follow_ups_prefer_questions() {
        let reply = "わかったわ。何時に寝たの？朝ごはんは食べた？";
        assert_eq!(
            follow_up_suggestions(reply, &["睡眠".to_string()]),
            vec!["何時に寝たの？", "朝ごはんは食べた？"]
        );
    }

    #[test]
    fn test_follow_ups_fall_back_to_topics() {
        let topics = vec!["料理".to_string(), "掃除".to_string()];
        assert_eq!(
            follow_up_suggestions("がんばってね。", &topics),
            vec!["料理についてもっと教えて", "掃除についてもっと教えて"]
        );
    }

    #[test]
    fn test_analyze_reply_fills_every_field() {
        let engine = TextAnalysisEngine::new();
        let analysis = analyze_reply(&engine, "洗濯 洗濯 の コツ を 教える わ 。 嬉しい");
        assert_eq!(analysis.intent, ResponseIntent::Advice);
        assert!(analysis.topics.contains(&"洗濯".to_string()));
        assert!(analysis.key_points.len() <= 3);
        assert!(analysis.follow_up_suggestions.len() <= 3);
    }
}
