//! Session data model (spec.md §3 "Session").
//!
//! A session owns an ordered conversation history and a rolling summary.
//! Compaction itself (the policy for when/how to fold history into the
//! summary) lives in `conclave-supervisor::session_store`; this module only
//! defines the shape and the budget invariant helpers.

use crate::artifact::Artifact;
use crate::ids::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message in the conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A single turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool name, when `role == Tool`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Correlates a tool message back to the invocation that produced it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
            call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name: None,
            call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn tool(name: impl Into<String>, call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            name: Some(name.into()),
            call_id: Some(call_id.into()),
            timestamp: Utc::now(),
        }
    }

    /// Approximate character cost of this message for budget accounting.
    pub fn char_len(&self) -> usize {
        self.content.len() + self.name.as_ref().map_or(0, |n| n.len())
    }
}

/// Free-form rolling summary, capped at a character budget (spec.md §4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary(String);

impl Summary {
    pub fn new() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Append `text` to the summary, then truncate from the front so the
    /// result never exceeds `max_chars` — the oldest summarized content is
    /// dropped first, per spec.md §4.7.
    pub fn push_bounded(&mut self, text: &str, max_chars: usize) {
        if !self.0.is_empty() {
            self.0.push('\n');
        }
        self.0.push_str(text);
        if self.0.chars().count() > max_chars {
            let skip = self.0.chars().count() - max_chars;
            self.0 = self.0.chars().skip(skip).collect();
        }
    }
}

/// A conversation session: history, artifacts, and a rolling summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub history: Vec<Message>,
    pub artifacts: Vec<Artifact>,
    pub summary: Summary,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: Vec::new(),
            artifacts: Vec::new(),
            summary: Summary::new(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Total characters across summary and history — the quantity the
    /// session budget bounds (spec.md §3 invariant).
    pub fn total_chars(&self) -> usize {
        self.summary.char_len() + self.history.iter().map(Message::char_len).sum::<usize>()
    }

    pub fn append(&mut self, message: Message) {
        self.last_active_at = Utc::now();
        self.history.push(message);
    }

    pub fn append_artifact(&mut self, artifact: Artifact) {
        self.last_active_at = Utc::now();
        self.artifacts.push(artifact);
    }
}
