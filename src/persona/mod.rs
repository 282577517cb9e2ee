//! Persona prompt assembly, persona switching and re-priming.
//!
//! Every table in this module matches [`Persona`] exhaustively, so adding a
//! persona fails to compile until its templates exist.

mod templates;

use crate::llm::GenerationClient;
use crate::session::Session;
use crate::types::{Message, MessageRole, Persona};
use serde::Serialize;
use templates::*;
use utoipa::ToSchema;

/// Display metadata for one persona.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PersonaProfile {
    pub persona: Persona,
    pub display_name: String,
    pub description: String,
    pub welcome: String,
    pub examples: Vec<String>,
}

/// Outcome of replaying a transcript into a freshly reset generation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RePrimeReport {
    /// Whether the generation session accepted the new system prompt.
    pub reset_ok: bool,
    pub replayed: usize,
    /// Indexes into the replayed turns that were rejected.
    pub failed: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaPromptBuilder;

impl PersonaPromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn system_prompt(&self, persona: Persona) -> &'static str {
        match persona {
            Persona::Caring => CARING_SYSTEM_PROMPT,
            Persona::Strict => STRICT_SYSTEM_PROMPT,
            Persona::Fun => FUN_SYSTEM_PROMPT,
        }
    }

    /// Closing instruction appended after the transcript.
    pub fn tone_directive(&self, persona: Persona) -> &'static str {
        match persona {
            Persona::Caring => CARING_TONE,
            Persona::Strict => STRICT_TONE,
            Persona::Fun => FUN_TONE,
        }
    }

    /// Assembles the full prompt: system template, digest, transcript and
    /// tone directive, separated by blank lines. An empty digest is omitted.
    pub fn build_contextual_prompt(
        &self,
        persona: Persona,
        digest: &str,
        recent_messages: &[Message],
    ) -> String {
        let transcript = recent_messages
            .iter()
            .map(|m| format!("{}: {}", speaker(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut sections = vec![self.system_prompt(persona)];
        if !digest.trim().is_empty() {
            sections.push(digest);
        }
        sections.push(TRANSCRIPT_HEADER);
        if !transcript.is_empty() {
            sections.push(transcript.as_str());
        }
        sections.push(self.tone_directive(persona));

        sections.join("\n\n")
    }

    /// Message announcing a switch to `persona`.
    pub fn transition_message(&self, persona: Persona, user_name: Option<&str>) -> String {
        let body = match persona {
            Persona::Caring => CARING_TRANSITION,
            Persona::Strict => STRICT_TRANSITION,
            Persona::Fun => FUN_TRANSITION,
        };
        match non_blank(user_name) {
            Some(name) => format!("{}、{}", name, body),
            None => body.to_string(),
        }
    }

    /// First-contact greeting for a brand new session.
    pub fn greeting(&self, persona: Persona, user_name: Option<&str>) -> String {
        let body = match persona {
            Persona::Caring => CARING_GREETING,
            Persona::Strict => STRICT_GREETING,
            Persona::Fun => FUN_GREETING,
        };
        match non_blank(user_name) {
            Some(name) => format!("{}ちゃん、{}", name, body),
            None => body.to_string(),
        }
    }

    /// Switches `session` to `new_persona` and appends the transition message.
    ///
    /// History is never removed apart from the usual oldest-first eviction at
    /// `max_messages`. Returns `None` when the session already uses `new_persona`.
    pub fn switch_persona(
        &self,
        session: &mut Session,
        new_persona: Persona,
        max_messages: usize,
    ) -> Option<Message> {
        if session.persona == new_persona {
            return None;
        }

        let text = self.transition_message(new_persona, session.user_name.as_deref());
        session.persona = new_persona;
        Some(session.append(MessageRole::Assistant, text, max_messages))
    }

    pub fn catalog(&self) -> Vec<PersonaProfile> {
        Persona::ALL.iter().map(|&p| self.profile(p)).collect()
    }

    pub fn profile(&self, persona: Persona) -> PersonaProfile {
        let (display_name, description, welcome, examples) = match persona {
            Persona::Caring => (
                "思いやりのある母",
                "優しく励ましてくれる母親のようなAI",
                CARING_WELCOME,
                CARING_EXAMPLES,
            ),
            Persona::Strict => (
                "厳しい母",
                "厳しくも愛情深い母親のようなAI",
                STRICT_WELCOME,
                STRICT_EXAMPLES,
            ),
            Persona::Fun => (
                "楽しい母",
                "ユーモアたっぷりの母親のようなAI",
                FUN_WELCOME,
                FUN_EXAMPLES,
            ),
        };

        PersonaProfile {
            persona,
            display_name: display_name.to_string(),
            description: description.to_string(),
            welcome: welcome.to_string(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Resets the external generation session to `persona` and replays
    /// `turns` in order.
    ///
    /// A rejected turn is logged and skipped. If the reset itself fails no
    /// turns are replayed. Nothing here returns an error.
    pub async fn reprime(
        &self,
        client: &dyn GenerationClient,
        session_id: &str,
        persona: Persona,
        turns: &[Message],
    ) -> RePrimeReport {
        let mut report = RePrimeReport::default();

        if let Err(e) = client
            .reset_session(session_id, self.system_prompt(persona))
            .await
        {
            tracing::warn!(session_id, %persona, error = %e, "Failed to reset generation session");
            return report;
        }
        report.reset_ok = true;

        for (index, turn) in turns.iter().enumerate() {
            match client.replay_turn(session_id, turn).await {
                Ok(()) => report.replayed += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id,
                        index,
                        role = turn.role.as_str(),
                        error = %e,
                        "Skipping turn during re-prime"
                    );
                    report.failed.push(index);
                }
            }
        }

        tracing::debug!(
            session_id,
            %persona,
            replayed = report.replayed,
            failed = report.failed.len(),
            "Generation session re-primed"
        );

        report
    }
}

fn speaker(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "ユーザー",
        MessageRole::Assistant => "AI",
    }
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_persona_has_distinct_templates() {
        let builder = PersonaPromptBuilder::new();
        let prompts: Vec<_> = Persona::ALL.iter().map(|&p| builder.system_prompt(p)).collect();
        assert!(prompts[0].contains("思いやりのある母親"));
        assert!(prompts[1].contains("厳格な母親"));
        assert!(prompts[2].contains("楽しい母親"));
        assert_eq!(builder.tone_directive(Persona::Strict), "きっぱりとした言葉で返してください。");
    }

    #[test]
    fn test_contextual_prompt_layout() {
        let builder = PersonaPromptBuilder::new();
        let recent = vec![
            Message::user("洗濯のコツは？", 1),
            Message::assistant("ぬるま湯を使うといいわよ", 2),
        ];
        let prompt = builder.build_contextual_prompt(Persona::Caring, "【会話の要約】", &recent);

        let system = prompt.find("# 思いやりのある母親").unwrap();
        let digest = prompt.find("【会話の要約】").unwrap();
        let header = prompt.find(TRANSCRIPT_HEADER).unwrap();
        let user = prompt.find("ユーザー: 洗濯のコツは？").unwrap();
        let ai = prompt.find("AI: ぬるま湯を使うといいわよ").unwrap();
        assert!(system < digest && digest < header && header < user && user < ai);
        assert!(prompt.ends_with(CARING_TONE));
    }

    #[test]
    fn test_contextual_prompt_is_deterministic_and_skips_empty_digest() {
        let builder = PersonaPromptBuilder::new();
        let recent = vec![Message::user("こんにちは", 1)];
        let a = builder.build_contextual_prompt(Persona::Fun, "", &recent);
        let b = builder.build_contextual_prompt(Persona::Fun, "", &recent);
        assert_eq!(a, b);
        assert!(!a.contains("\n\n\n\n"));
    }

    #[test]
    fn test_transition_and_greeting_use_name() {
        let builder = PersonaPromptBuilder::new();
        assert_eq!(
            builder.transition_message(Persona::Strict, Some("太郎")),
            "太郎、こんにちは。厳しいかあちゃんになったからね。しっかり相談にのるわよ。"
        );
        assert_eq!(
            builder.transition_message(Persona::Fun, Some("  ")),
            FUN_TRANSITION
        );
        assert!(builder
            .greeting(Persona::Caring, Some("花子"))
            .starts_with("花子ちゃん、はじめまして。"));
    }

    #[test]
    fn test_switch_persona_only_appends() {
        let builder = PersonaPromptBuilder::new();
        let mut session = Session::new(Persona::Caring, None);
        session.append(MessageRole::User, "こんにちは", 100);
        let before = session.messages.clone();

        let added = builder.switch_persona(&mut session, Persona::Fun, 100);
        assert!(added.is_some());
        assert_eq!(session.persona, Persona::Fun);
        assert_eq!(session.messages.len(), before.len() + 1);
        assert_eq!(&session.messages[..before.len()], &before[..]);
        assert_eq!(session.messages.last().unwrap().role, MessageRole::Assistant);
    }

    #[test]
    fn test_switch_to_same_persona_is_noop() {
        let builder = PersonaPromptBuilder::new();
        let mut session = Session::new(Persona::Strict, None);
        assert!(builder
            .switch_persona(&mut session, Persona::Strict, 100)
            .is_none());
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_catalog_covers_all_personas() {
        let catalog = PersonaPromptBuilder::new().catalog();
        assert_eq!(catalog.len(), Persona::ALL.len());
        assert!(catalog.iter().all(|p| p.examples.len() == 3));
        assert_eq!(catalog[1].display_name, "厳しい母");
    }
}
