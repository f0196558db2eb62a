//! Artifacts: immutable records produced by tool calls (spec.md §3).
//!
//! An artifact carries the session id as plain data, never a back-pointer —
//! sessions own artifacts, never the reverse, which keeps the aggregate
//! graph acyclic.

use crate::ids::{ArtifactId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of result an artifact captures. Known kinds get a fixed
/// variant so follow-up queries ("highest-risk item") can match on them
/// without string comparisons; anything else falls into `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Risk,
    Advisory,
    DependencyScan,
    Domain,
    Reporting,
    SessionAnalysis,
    Custom(String),
}

impl ArtifactKind {
    pub fn as_str(&self) -> &str {
        match self {
            ArtifactKind::Risk => "risk",
            ArtifactKind::Advisory => "advisory",
            ArtifactKind::DependencyScan => "dependency_scan",
            ArtifactKind::Domain => "domain",
            ArtifactKind::Reporting => "reporting",
            ArtifactKind::SessionAnalysis => "session_analysis",
            ArtifactKind::Custom(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub session_id: SessionId,
    pub kind: ArtifactKind,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(session_id: SessionId, kind: ArtifactKind, payload: Value) -> Self {
        Self {
            id: ArtifactId::new(),
            session_id,
            kind,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Best-effort numeric extraction for a named field, used by
    /// follow-up-query handlers like "which should we fix first" that rank
    /// artifacts by a score embedded in the payload.
    pub fn numeric_field(&self, field: &str) -> Option<f64> {
        self.payload.get(field)?.as_f64()
    }
}
