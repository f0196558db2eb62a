//! The per-turn observability surface (spec.md §4.5): every step of
//! reason → act → summarize appends a tagged event, returned to the
//! caller alongside the reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Route { intent: String, entities: Value },
    ToolCall { tool: String, args: Value },
    ToolResult { tool: String, status: String, duration_ms: u64 },
    ParameterResolved { tool: String, field: String, value: String, message: String },
    Reply { text: String },
    Error { tool: Option<String>, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace(pub Vec<TraceEvent>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.0.push(event);
    }

    pub fn errors(&self) -> impl Iterator<Item = &TraceEvent> {
        self.0.iter().filter(|e| matches!(e, TraceEvent::Error { .. }))
    }
}
