//! Mock generation client shared by the integration tests.
//!
//! [`MockGenerationClient`] records every call it receives so tests can assert
//! on prompts, resets and replays without a network round-trip.

use async_trait::async_trait;
use kaachan::llm::{GenerationClient, GenerationError};
use kaachan::types::Message;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted generation client.
///
/// Replies are taken from the script in order; once it runs dry the default
/// reply is returned.
///
/// ```ignore
/// let client = MockGenerationClient::new("はいはい")
///     .with_delay(Duration::from_secs(20))
///     .with_script(vec![Err(GenerationError::RateLimit("quota".to_string()))]);
/// ```
pub struct MockGenerationClient {
    default_reply: String,
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    delay: Option<Duration>,
    always_fail: Option<GenerationError>,
    fail_reset: bool,
    /// Replays whose content equals one of these fail with `InvalidInput`.
    fail_replay_of: Vec<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    resets: Mutex<Vec<(String, String)>>,
    replays: Mutex<Vec<(String, Message)>>,
    ended: Mutex<Vec<String>>,
}

impl MockGenerationClient {
    pub fn new(default_reply: &str) -> Self {
        Self {
            default_reply: default_reply.to_string(),
            script: Mutex::new(VecDeque::new()),
            delay: None,
            always_fail: None,
            fail_reset: false,
            fail_replay_of: Vec::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            resets: Mutex::new(Vec::new()),
            replays: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every generation fails with the given error.
    pub fn failing(error: GenerationError) -> Self {
        Self {
            always_fail: Some(error),
            ..Self::new("")
        }
    }

    pub fn with_script(self, script: Vec<Result<String, GenerationError>>) -> Self {
        self.script.lock().extend(script);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn with_failing_replay_of(mut self, content: &str) -> Self {
        self.fail_replay_of.push(content.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn resets(&self) -> Vec<(String, String)> {
        self.resets.lock().clone()
    }

    pub fn replays(&self) -> Vec<(String, Message)> {
        self.replays.lock().clone()
    }

    pub fn ended(&self) -> Vec<String> {
        self.ended.lock().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, _session_id: &str, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.always_fail {
            return Err(error.clone());
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    async fn reset_session(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> Result<(), GenerationError> {
        if self.fail_reset {
            return Err(GenerationError::Other("reset refused".to_string()));
        }
        self.resets
            .lock()
            .push((session_id.to_string(), system_prompt.to_string()));
        Ok(())
    }

    async fn replay_turn(&self, session_id: &str, turn: &Message) -> Result<(), GenerationError> {
        if self.fail_replay_of.iter().any(|c| c == &turn.content) {
            return Err(GenerationError::InvalidInput(turn.content.clone()));
        }
        self.replays
            .lock()
            .push((session_id.to_string(), turn.clone()));
        Ok(())
    }

    async fn end_session(&self, session_id: &str) {
        self.ended.lock().push(session_id.to_string());
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
