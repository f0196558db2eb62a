//! Tool descriptors, results, and invocation records (spec.md §3, §4.2).

use crate::ids::{RequestId, SessionId, ToolInvocationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// The primitive types a tool argument can take. Deliberately small —
/// tools validate structured constraints themselves; this only drives
/// required/default/type-mismatch checks at the dispatcher boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ArgKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Integer => value.is_i64() || value.is_u64(),
            ArgKind::Number => value.is_number(),
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::Object => value.is_object(),
            ArgKind::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ArgSpec {
    pub fn required(kind: ArgKind) -> Self {
        Self {
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(kind: ArgKind, default: Value) -> Self {
        Self {
            kind,
            required: false,
            default: Some(default),
        }
    }
}

/// Declarative signature for one tool, owned by the registry for the
/// lifetime of the process (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub args: BTreeMap<String, ArgSpec>,
    /// Whether the result is safe to cache (read-only, idempotent).
    pub cacheable: bool,
    /// Whether the call mutates external state (never cached, typically
    /// approval-gated).
    pub mutating: bool,
    pub requires_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<Duration>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args: BTreeMap::new(),
            cacheable: false,
            mutating: false,
            requires_approval: false,
            cache_ttl: None,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.args.insert(name.into(), spec);
        self
    }

    pub fn cacheable(mut self, ttl: Duration) -> Self {
        self.cacheable = true;
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    pub fn requires_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

/// Cache-hit metadata embedded in every tool result envelope.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheInfo {
    pub hit: bool,
}

/// The uniform tool-result envelope every tool call returns, regardless of
/// transport quirks (spec.md §3 "Tool Result").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ToolResult {
    #[serde(rename = "success")]
    Success {
        data: Value,
        timestamp: DateTime<Utc>,
        source: String,
        duration_ms: u64,
        cache: CacheInfo,
    },
    #[serde(rename = "error")]
    Error {
        error: String,
        timestamp: DateTime<Utc>,
        source: String,
        duration_ms: u64,
        cache: CacheInfo,
    },
}

impl ToolResult {
    pub fn success(source: impl Into<String>, data: Value, duration_ms: u64, cache_hit: bool) -> Self {
        ToolResult::Success {
            data,
            timestamp: Utc::now(),
            source: source.into(),
            duration_ms,
            cache: CacheInfo { hit: cache_hit },
        }
    }

    pub fn error(source: impl Into<String>, message: impl Into<String>, duration_ms: u64) -> Self {
        ToolResult::Error {
            error: message.into(),
            timestamp: Utc::now(),
            source: source.into(),
            duration_ms,
            cache: CacheInfo { hit: false },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { data, .. } => Some(data),
            ToolResult::Error { .. } => None,
        }
    }
}

/// Append-only audit record of one tool invocation (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub id: ToolInvocationId,
    pub request_id: RequestId,
    pub session_id: SessionId,
    pub tool_name: String,
    /// Args with sensitive substrings masked (see `crate::masking`).
    pub masked_args: Value,
    pub status: String,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arg_kind_matches_json_values() {
        assert!(ArgKind::String.matches(&json!("hi")));
        assert!(!ArgKind::String.matches(&json!(1)));
        assert!(ArgKind::Integer.matches(&json!(42)));
        assert!(!ArgKind::Integer.matches(&json!(4.2)));
        assert!(ArgKind::Number.matches(&json!(4.2)));
    }

    #[test]
    fn tool_result_serializes_with_status_tag() {
        let result = ToolResult::success("demo", json!({"n": 1}), 12, false);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["n"], 1);
        assert_eq!(value["cache"]["hit"], false);
    }

    #[test]
    fn tool_result_error_carries_message_not_data() {
        let result = ToolResult::error("demo", "boom", 3);
        assert!(!result.is_success());
        assert!(result.data().is_none());
    }
}
