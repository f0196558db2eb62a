//! Session state and compaction (spec.md §4.7, §3 "Session"). No direct
//! Python original for this module — the original corpora kept session
//! state in-process per specialist with no shared compaction policy, so
//! this is grounded in spec.md's own invariant text plus the teacher's
//! `memory.rs` pattern of a trait-bound store behind `Arc<dyn ...>` with
//! a `DashMap`-backed in-memory implementation.

use async_trait::async_trait;
use conclave_core::artifact::Artifact;
use conclave_core::ids::SessionId;
use conclave_core::session::{Message, Session};
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session '{0}' not found")]
    NotFound(SessionId),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: SessionId) -> Session;
    async fn append_turn(&self, session_id: SessionId, user_text: &str, assistant_text: &str);
    async fn append_artifact(&self, session_id: SessionId, artifact: Artifact);
    async fn get_artifacts(&self, session_id: SessionId) -> Vec<Artifact>;
    async fn delete(&self, session_id: SessionId) -> Result<(), SessionStoreError>;
}

/// Compaction thresholds (spec.md §4.7 "Compaction trigger").
#[derive(Debug, Clone, Copy)]
pub struct CompactionConfig {
    pub text_limit: usize,
    pub keep_messages: usize,
    /// History length beyond `keep_messages * overflow_factor` also
    /// triggers compaction, independent of the character budget.
    pub overflow_factor: usize,
    pub summary_max_chars: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            text_limit: 8_000,
            keep_messages: 20,
            overflow_factor: 3,
            summary_max_chars: 2_000,
        }
    }
}

/// Deterministic fallback summarizer (spec.md §4.7 "local compactor"):
/// role-prefixed, one line per folded message.
pub struct LocalCompactor;

impl LocalCompactor {
    pub fn summarize(&self, messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| format!("{:?}: {}", m.role, one_line(&m.content)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn should_compact(session: &Session, config: &CompactionConfig) -> bool {
    session.total_chars() > config.text_limit || session.history.len() > config.keep_messages * config.overflow_factor
}

/// Fold everything but the most recent `keep_messages` into the rolling
/// summary, maintaining the invariant that no message in `History` after
/// compaction is also represented in `Summary`.
fn compact(session: &mut Session, config: &CompactionConfig, compactor: &LocalCompactor) {
    if !should_compact(session, config) {
        return;
    }
    let keep_from = session.history.len().saturating_sub(config.keep_messages);
    let to_fold: Vec<Message> = session.history.drain(..keep_from).collect();
    if !to_fold.is_empty() {
        let excerpt = compactor.summarize(&to_fold);
        session.summary.push_bounded(&excerpt, config.summary_max_chars);
    }
}

pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Session>,
    config: CompactionConfig,
    compactor: LocalCompactor,
}

impl InMemorySessionStore {
    pub fn new(config: CompactionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            compactor: LocalCompactor,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(CompactionConfig::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: SessionId) -> Session {
        self.sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(session_id))
            .clone()
    }

    async fn append_turn(&self, session_id: SessionId, user_text: &str, assistant_text: &str) {
        let mut entry = self.sessions.entry(session_id).or_insert_with(|| Session::new(session_id));
        entry.append(Message::user(user_text));
        entry.append(Message::assistant(assistant_text));
        compact(&mut entry, &self.config, &self.compactor);
    }

    async fn append_artifact(&self, session_id: SessionId, artifact: Artifact) {
        let mut entry = self.sessions.entry(session_id).or_insert_with(|| Session::new(session_id));
        entry.append_artifact(artifact);
    }

    async fn get_artifacts(&self, session_id: SessionId) -> Vec<Artifact> {
        self.sessions.get(&session_id).map(|s| s.artifacts.clone()).unwrap_or_default()
    }

    async fn delete(&self, session_id: SessionId) -> Result<(), SessionStoreError> {
        self.sessions.remove(&session_id).map(|_| ()).ok_or(SessionStoreError::NotFound(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_turn_grows_history() {
        let store = InMemorySessionStore::default();
        let id = SessionId::new();
        store.append_turn(id, "hi", "hello").await;
        let session = store.load(id).await;
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = InMemorySessionStore::default();
        let id = SessionId::new();
        store.append_turn(id, "hi", "hello").await;
        store.delete(id).await.unwrap();
        assert!(matches!(store.delete(id).await, Err(SessionStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn compaction_keeps_recent_messages_verbatim_and_folds_the_rest() {
        let store = InMemorySessionStore::new(CompactionConfig {
            text_limit: 100_000,
            keep_messages: 2,
            overflow_factor: 1,
            summary_max_chars: 10_000,
        });
        let id = SessionId::new();
        for i in 0..5 {
            store.append_turn(id, &format!("user {i}"), &format!("assistant {i}")).await;
        }
        let session = store.load(id).await;
        assert!(session.history.len() <= 2);
        assert!(!session.summary.as_str().is_empty());
        assert!(session.summary.as_str().contains("user 0"));
    }

    #[tokio::test]
    async fn compaction_respects_summary_char_budget() {
        let store = InMemorySessionStore::new(CompactionConfig {
            text_limit: 10,
            keep_messages: 0,
            overflow_factor: 1,
            summary_max_chars: 20,
        });
        let id = SessionId::new();
        for i in 0..10 {
            store.append_turn(id, &format!("message number {i} with extra padding text"), "ack").await;
        }
        let session = store.load(id).await;
        assert!(session.summary.char_len() <= 20);
    }
}
