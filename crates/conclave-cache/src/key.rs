//! Cache key construction, ported from
//! `original_source/GitHub-Multi-Agent/shared/cache_keys.py`.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sort object keys so structurally-equal-but-differently-
/// ordered args hash to the same digest. Arrays keep their order — it's
/// semantically meaningful for tool args.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), normalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// `mcp:{server}:{tool}:{tool_version}:{sha256(canonical args)}`.
pub fn build_tool_cache_key(server: &str, tool: &str, args: &Value, tool_version: &str) -> String {
    let normalized = normalize(args);
    let payload = serde_json::to_vec(&normalized).expect("normalized args are always serializable");
    let digest = hex::encode(Sha256::digest(&payload));
    format!("mcp:{server}:{tool}:{tool_version}:{digest}")
}

pub fn build_stream_key(session_id: &str, stream_id: &str) -> String {
    format!("stream:{session_id}:{stream_id}")
}
