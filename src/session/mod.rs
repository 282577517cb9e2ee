//! Session records and their persistence.
//!
//! A [`Session`] owns the transcript, the active persona and the persisted
//! conversation summary. [`SessionStore`] serializes sessions into a
//! [`KeyValueStore`] under `session_{id}` keys, enforces the TTL on every
//! read, and falls back to process memory if the backend starts failing.

pub mod storage;

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

use crate::memory::ConversationSummary;
use crate::types::{Message, MessageRole, Persona};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

/// Maximum messages retained per session; older ones are evicted first.
pub const MAX_MESSAGES: usize = 100;

/// Idle time after which a session is discarded.
pub const SESSION_TTL_HOURS: i64 = 24;

const KEY_PREFIX: &str = "session_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub persona: Persona,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: ConversationSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Session {
    pub fn new(persona: Persona, user_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            persona,
            created_at: now,
            last_accessed_at: now,
            summary: ConversationSummary::default(),
            user_name: user_name.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Appends a message stamped with the current time, never earlier than
    /// the previous message, then evicts from the front down to `max_messages`.
    pub fn append(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        max_messages: usize,
    ) -> Message {
        let now_ms = Utc::now().timestamp_millis();
        let timestamp = self
            .messages
            .last()
            .map_or(now_ms, |last| now_ms.max(last.timestamp));

        let message = Message::new(role, content, timestamp);
        self.messages.push(message.clone());
        self.enforce_cap(max_messages);
        self.touch();
        message
    }

    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_accessed_at > ttl
    }

    fn enforce_cap(&mut self, max_messages: usize) {
        if self.messages.len() > max_messages {
            let excess = self.messages.len() - max_messages;
            self.messages.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub max_messages: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(SESSION_TTL_HOURS),
            max_messages: MAX_MESSAGES,
        }
    }
}

/// TTL-aware session repository.
///
/// Backend failures are never surfaced: the first one switches the store to
/// an in-process [`MemoryStore`] for the rest of its lifetime. A malformed
/// session id is not a backend failure and reads as a missing record.
///
/// Sessions the store drops on its own (expired or unreadable) are queued
/// until [`SessionStore::take_evicted`] is called, so the owner can release
/// whatever it keeps per session.
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    fallback: MemoryStore,
    degraded: AtomicBool,
    settings: SessionSettings,
    evicted: Mutex<Vec<String>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, settings: SessionSettings) -> Self {
        Self {
            backend,
            fallback: MemoryStore::new(),
            degraded: AtomicBool::new(false),
            settings,
            evicted: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory(settings: SessionSettings) -> Self {
        Self::new(Arc::new(MemoryStore::new()), settings)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Loads a live session. Missing, expired and unreadable records all
    /// yield `None`; the latter two are removed.
    pub fn load(&self, session_id: &str) -> Option<Session> {
        self.load_at(session_id, Utc::now())
    }

    pub fn load_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Session> {
        let key = session_key(session_id);
        let raw = self.with_backend("get", |store| store.get(&key))??;

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Discarding unreadable session record");
                self.evict(session_id, &key);
                return None;
            }
        };

        if session.is_expired_at(now, self.settings.ttl) {
            tracing::debug!(session_id, "Session expired");
            self.evict(session_id, &key);
            return None;
        }

        Some(session)
    }

    /// Persists `session`, trimming it to the message cap first.
    pub fn save(&self, session: &mut Session) {
        session.enforce_cap(self.settings.max_messages);

        let raw = match serde_json::to_string(&*session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(session_id = %session.session_id, error = %e, "Failed to serialize session");
                return;
            }
        };

        let key = session_key(&session.session_id);
        if self.is_degraded() {
            let _ = self.fallback.set(&key, &raw);
            return;
        }

        if let Err(first) = self.backend.set(&key, &raw) {
            if matches!(first, StorageError::InvalidKey(_)) {
                tracing::warn!(session_id = %session.session_id, "Refusing to persist session with a malformed id");
                return;
            }
            tracing::debug!(error = %first, "Session write failed, purging expired sessions and retrying");
            self.purge_expired();
            if let Err(e) = self.backend.set(&key, &raw) {
                self.degrade("set", &e);
                let _ = self.fallback.set(&key, &raw);
            }
        }
    }

    pub fn create(&self, persona: Persona, user_name: Option<String>) -> Session {
        let mut session = Session::new(persona, user_name);
        self.save(&mut session);
        tracing::debug!(session_id = %session.session_id, %persona, "Session created");
        session
    }

    pub fn remove(&self, session_id: &str) {
        self.discard(&session_key(session_id));
    }

    /// Deletes every expired or unreadable session and returns their ids.
    /// The ids are also queued for [`SessionStore::take_evicted`].
    pub fn purge_expired(&self) -> Vec<String> {
        let now = Utc::now();
        let Some(keys) = self.with_backend("keys", |store| store.keys()) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(KEY_PREFIX)) {
            let stale = match self.with_backend("get", |store| store.get(key)).flatten() {
                Some(raw) => serde_json::from_str::<Session>(&raw)
                    .map(|s| s.is_expired_at(now, self.settings.ttl))
                    .unwrap_or(true),
                None => false,
            };
            if stale {
                let session_id = &key[KEY_PREFIX.len()..];
                self.evict(session_id, key);
                removed.push(session_id.to_string());
            }
        }

        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), "Purged expired sessions");
        }
        removed
    }

    /// Drains the ids of sessions dropped by expiry or corruption since the
    /// last call.
    pub fn take_evicted(&self) -> Vec<String> {
        std::mem::take(&mut *self.evicted.lock())
    }

    fn evict(&self, session_id: &str, key: &str) {
        self.discard(key);
        self.evicted.lock().push(session_id.to_string());
    }

    fn discard(&self, key: &str) {
        let _ = self.with_backend("remove", |store| store.remove(key));
    }

    /// Runs `op` against the active backend. On failure the store degrades
    /// and the operation is retried once against the fallback.
    fn with_backend<T>(
        &self,
        op: &'static str,
        f: impl Fn(&dyn KeyValueStore) -> Result<T, StorageError>,
    ) -> Option<T> {
        if !self.is_degraded() {
            match f(self.backend.as_ref()) {
                Ok(value) => return Some(value),
                Err(StorageError::InvalidKey(key)) => {
                    tracing::debug!(op, key = %key, "Ignoring malformed session key");
                    return None;
                }
                Err(e) => self.degrade(op, &e),
            }
        }
        f(&self.fallback).ok()
    }

    fn degrade(&self, op: &str, error: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                backend = self.backend.name(),
                op,
                error = %error,
                "Session storage failed, falling back to in-memory sessions"
            );
        }
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_evicts_oldest_first() {
        let mut session = Session::new(Persona::Caring, None);
        for i in 0..105 {
            session.append(MessageRole::User, format!("msg {}", i), MAX_MESSAGES);
        }
        assert_eq!(session.messages.len(), MAX_MESSAGES);
        assert_eq!(session.messages[0].content, "msg 5");
        assert_eq!(session.messages[99].content, "msg 104");
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut session = Session::new(Persona::Fun, None);
        session.messages.push(Message::user("from the future", i64::MAX / 2));
        let next = session.append(MessageRole::Assistant, "reply", MAX_MESSAGES);
        assert_eq!(next.timestamp, i64::MAX / 2);
    }

    #[test]
    fn test_blank_user_name_is_dropped() {
        let session = Session::new(Persona::Caring, Some("  ".to_string()));
        assert!(session.user_name.is_none());
    }

    #[test]
    fn test_expiry_is_strictly_after_ttl() {
        let session = Session::new(Persona::Caring, None);
        let ttl = Duration::hours(24);
        assert!(!session.is_expired_at(session.last_accessed_at + ttl, ttl));
        assert!(session.is_expired_at(session.last_accessed_at + ttl + Duration::seconds(1), ttl));
    }

    #[test]
    fn test_store_load_checks_ttl() {
        let store = SessionStore::in_memory(SessionSettings::default());
        let session = store.create(Persona::Strict, None);
        let later = Utc::now() + Duration::hours(25);

        assert!(store.load(&session.session_id).is_some());
        assert!(store.load_at(&session.session_id, later).is_none());
        // Expired records are removed, not just hidden.
        assert!(store.load(&session.session_id).is_none());
        assert_eq!(store.take_evicted(), vec![session.session_id.clone()]);
        assert!(store.take_evicted().is_empty());
    }
}
