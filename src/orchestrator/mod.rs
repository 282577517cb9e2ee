//! Per-message control flow.
//!
//! [`ResponseOrchestrator`] ties the session store, context manager, prompt
//! builder and generation client together. All collaborators are injected;
//! there is no global state. Work on one session is serialized through
//! [`SessionLocks`], while different sessions run concurrently.

mod locks;
pub mod reply;

pub use locks::SessionLocks;

use crate::analysis::TextAnalysisEngine;
use crate::llm::GenerationClient;
use crate::memory::{recent_window, ConversationContextManager, ConversationSummary};
use crate::persona::{PersonaPromptBuilder, RePrimeReport};
use crate::session::{Session, SessionStore};
use crate::types::{AppError, Message, MessageRole, Persona, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Messages the summary and prompt transcript are built from.
    pub history_window: usize,
    pub max_messages: usize,
    /// Upper bound on a trimmed user message, in characters.
    pub max_message_chars: usize,
    pub generation_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            history_window: crate::memory::DEFAULT_HISTORY_WINDOW,
            max_messages: crate::session::MAX_MESSAGES,
            max_message_chars: 500,
            generation_timeout: Duration::from_millis(15_000),
        }
    }
}

/// Result of one successful user turn.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub session_id: String,
    pub response: String,
    pub summary: ConversationSummary,
    pub history: Vec<Message>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct PersonaSwitchOutcome {
    pub session: Session,
    /// `None` when the session already had the requested persona.
    pub transition: Option<Message>,
    pub reprime: Option<RePrimeReport>,
}

pub struct ResponseOrchestrator {
    client: Arc<dyn GenerationClient>,
    store: Arc<SessionStore>,
    engine: TextAnalysisEngine,
    prompts: PersonaPromptBuilder,
    settings: OrchestratorSettings,
    locks: SessionLocks,
}

impl ResponseOrchestrator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        store: Arc<SessionStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            store,
            engine: TextAnalysisEngine::new(),
            prompts: PersonaPromptBuilder::new(),
            settings,
            locks: SessionLocks::new(),
        }
    }

    pub fn with_engine(mut self, engine: TextAnalysisEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn prompts(&self) -> &PersonaPromptBuilder {
        &self.prompts
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Returns the trimmed message, or `Validation` if it is empty or too long.
    pub fn validate_message(&self, text: &str) -> Result<String> {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars == 0 {
            return Err(AppError::Validation("message is empty".to_string()));
        }
        if chars > self.settings.max_message_chars {
            return Err(AppError::Validation(format!(
                "message has {} characters, limit is {}",
                chars, self.settings.max_message_chars
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Checks a client-supplied transcript before it seeds a session. Every
    /// turn must be non-blank; user turns also obey the message length limit.
    pub fn validate_transcript(&self, turns: &[Message]) -> Result<Vec<Message>> {
        turns
            .iter()
            .map(|turn| {
                let content = match turn.role {
                    MessageRole::User => self.validate_message(&turn.content)?,
                    MessageRole::Assistant => {
                        let trimmed = turn.content.trim();
                        if trimmed.is_empty() {
                            return Err(AppError::Validation(
                                "assistant message is empty".to_string(),
                            ));
                        }
                        trimmed.to_string()
                    }
                };
                Ok(Message::new(turn.role, content, turn.timestamp))
            })
            .collect()
    }

    /// Starts a new session, optionally greeting the user in the persona's voice.
    pub async fn create_session(
        &self,
        persona: Persona,
        user_name: Option<String>,
        greet: bool,
    ) -> Result<Session> {
        Ok(self.start_session(persona, user_name, greet, &[]).await)
    }

    /// Loads `session_id` if it is live, otherwise starts a fresh session
    /// seeded with `transcript` (earlier turns the client already holds).
    pub async fn ensure_session(
        &self,
        session_id: Option<&str>,
        persona: Persona,
        user_name: Option<String>,
        transcript: &[Message],
    ) -> Result<Session> {
        let existing = session_id.and_then(|id| self.store.load(id));
        self.end_evicted().await;
        if let Some(session) = existing {
            return Ok(session);
        }

        let transcript = self.validate_transcript(transcript)?;
        Ok(self
            .start_session(persona, user_name, false, &transcript)
            .await)
    }

    /// Creates and persists a session, then primes the model session: a bare
    /// reset for an empty transcript, otherwise a reset plus replay of the
    /// recent window.
    async fn start_session(
        &self,
        persona: Persona,
        user_name: Option<String>,
        greet: bool,
        transcript: &[Message],
    ) -> Session {
        let max = self.settings.max_messages;
        let mut session = self.store.create(persona, user_name);

        if greet {
            let greeting = self
                .prompts
                .greeting(persona, session.user_name.as_deref());
            session.append(MessageRole::Assistant, greeting, max);
        }
        for turn in transcript {
            session.append(turn.role, turn.content.clone(), max);
        }
        if greet || !transcript.is_empty() {
            self.store.save(&mut session);
        }

        if transcript.is_empty() {
            if let Err(e) = self
                .client
                .reset_session(&session.session_id, self.prompts.system_prompt(persona))
                .await
            {
                tracing::warn!(session_id = %session.session_id, error = %e, "Failed to seed generation session");
            }
        } else {
            let window = recent_window(&session.messages, self.settings.history_window);
            self.prompts
                .reprime(self.client.as_ref(), &session.session_id, persona, window)
                .await;
        }

        tracing::info!(
            session_id = %session.session_id,
            %persona,
            seeded = session.messages.len(),
            "Session started"
        );
        session
    }

    /// Releases model-side state for sessions the store expired or discarded.
    async fn end_evicted(&self) {
        for session_id in self.store.take_evicted() {
            tracing::debug!(session_id, "Ending model session of evicted session");
            self.client.end_session(&session_id).await;
        }
    }

    pub fn get_session(&self, session_id: &str) -> Result<Session> {
        self.store
            .load(session_id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        {
            let _guard = self.locks.acquire(session_id).await;
            let existing = self.store.load(session_id);
            self.end_evicted().await;
            if existing.is_none() {
                return Err(AppError::NotFound(format!("session {}", session_id)));
            }
            self.store.remove(session_id);
            self.client.end_session(session_id).await;
        }
        self.locks.release_idle();
        tracing::info!(session_id, "Session deleted");
        Ok(())
    }

    /// Handles one user message end to end.
    ///
    /// Validation happens before anything is touched. Once accepted, the user
    /// message and refreshed summary are persisted even if generation then
    /// fails. A generation call still running when the timeout fires is
    /// dropped and its result never reaches the session.
    pub async fn generate_response(&self, session_id: &str, text: &str) -> Result<GenerationOutcome> {
        let text = self.validate_message(text)?;
        let guard = self.locks.acquire(session_id).await;

        let existing = self.store.load(session_id);
        self.end_evicted().await;
        let (mut session, _guard) = match existing {
            Some(session) => (session, guard),
            None => {
                drop(guard);
                tracing::info!(session_id, "Unknown or expired session, starting a new one");
                let session = self
                    .start_session(Persona::default(), None, false, &[])
                    .await;
                let guard = self.locks.acquire(&session.session_id).await;
                (session, guard)
            }
        };

        let window = self.settings.history_window;
        let max = self.settings.max_messages;

        session.append(MessageRole::User, text, max);

        let mut context = ConversationContextManager::with_summary(
            self.engine.clone(),
            window,
            session.summary.clone(),
        );
        context.update_context(&session.messages);
        let digest = context.summarize_for_prompt();
        let prompt = self.prompts.build_contextual_prompt(
            session.persona,
            &digest,
            recent_window(&session.messages, window),
        );

        session.summary = context.summary().clone();
        self.store.save(&mut session);

        let reply = self.call_with_timeout(&session, &prompt).await?;

        let analysis = reply::analyze_reply(&self.engine, &reply);
        let message = session.append(MessageRole::Assistant, reply.clone(), max);
        context.update_context(&session.messages);
        context.record_assistant_analysis(analysis);
        session.summary = context.into_summary();
        self.store.save(&mut session);

        Ok(GenerationOutcome {
            session_id: session.session_id.clone(),
            response: reply,
            summary: session.summary.clone(),
            history: session.messages.clone(),
            timestamp: message.timestamp,
        })
    }

    async fn call_with_timeout(&self, session: &Session, prompt: &str) -> Result<String> {
        let timeout = self.settings.generation_timeout;
        let started = Instant::now();
        let session_id = session.session_id.as_str();

        let outcome =
            tokio::time::timeout(timeout, self.client.generate(session_id, prompt)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Err(_) => {
                tracing::warn!(session_id, elapsed_ms, "Generation timed out");
                Err(AppError::Timeout(timeout.as_millis() as u64))
            }
            Ok(Err(e)) => {
                tracing::warn!(session_id, elapsed_ms, error = %e, "Generation failed");
                Err(e.into())
            }
            Ok(Ok(reply)) if reply.trim().is_empty() => {
                tracing::warn!(session_id, elapsed_ms, "Generation returned blank text");
                Err(AppError::EmptyResponse)
            }
            Ok(Ok(reply)) => {
                tracing::debug!(
                    session_id,
                    persona = %session.persona,
                    elapsed_ms,
                    chars = reply.chars().count(),
                    "Generation completed"
                );
                Ok(reply)
            }
        }
    }

    /// Switches the session's persona, appends the transition message and
    /// re-primes the generation session with the turns that preceded it.
    pub async fn switch_persona(
        &self,
        session_id: &str,
        persona: Persona,
    ) -> Result<PersonaSwitchOutcome> {
        let _guard = self.locks.acquire(session_id).await;

        let existing = self.store.load(session_id);
        self.end_evicted().await;
        let mut session =
            existing.ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))?;

        let prior: Vec<Message> =
            recent_window(&session.messages, self.settings.history_window).to_vec();

        let Some(transition) =
            self.prompts
                .switch_persona(&mut session, persona, self.settings.max_messages)
        else {
            return Ok(PersonaSwitchOutcome {
                session,
                transition: None,
                reprime: None,
            });
        };
        self.store.save(&mut session);

        let report = self
            .prompts
            .reprime(self.client.as_ref(), session_id, persona, &prior)
            .await;

        tracing::info!(
            session_id,
            %persona,
            replayed = report.replayed,
            failed = report.failed.len(),
            "Persona switched"
        );

        Ok(PersonaSwitchOutcome {
            session,
            transition: Some(transition),
            reprime: Some(report),
        })
    }

    /// Removes expired sessions, ends their model sessions and drops idle
    /// locks. Returns how many sessions were purged.
    pub async fn purge_expired(&self) -> usize {
        let removed = self.store.purge_expired().len();
        self.end_evicted().await;
        self.locks.release_idle();
        removed
    }
}
