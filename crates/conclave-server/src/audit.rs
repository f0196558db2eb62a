//! Tool-invocation audit logging, ported from
//! `original_source/GitHub-Multi-Agent/shared/audit.py::log_audit_event`.
//! Masks sensitive substrings before the args ever reach a log line.

use conclave_core::ids::{RequestId, SessionId, ToolInvocationId};
use conclave_core::masking::mask_value;
use conclave_core::tool::ToolInvocationRecord;
use serde_json::Value;

pub fn build_record(
    request_id: RequestId,
    session_id: SessionId,
    tool_name: &str,
    args: &Value,
    status: &str,
    latency_ms: u64,
    cache_hit: bool,
) -> ToolInvocationRecord {
    ToolInvocationRecord {
        id: ToolInvocationId::new(),
        request_id,
        session_id,
        tool_name: tool_name.to_string(),
        masked_args: mask_value(args),
        status: status.to_string(),
        latency_ms,
        cache_hit,
    }
}

pub fn log_audit_event(record: &ToolInvocationRecord) {
    tracing::info!(
        target: "audit",
        session_id = %record.session_id,
        tool_name = %record.tool_name,
        status = %record.status,
        latency_ms = record.latency_ms,
        cache_hit = record.cache_hit,
        args = %record.masked_args,
        "audit_event",
    );
    metrics::counter!("conclave_tool_invocations_total", "tool" => record.tool_name.clone(), "status" => record.status.clone()).increment(1);
    metrics::histogram!("conclave_tool_latency_ms", "tool" => record.tool_name.clone()).record(record.latency_ms as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_record_masks_args() {
        let record = build_record(
            RequestId::new(),
            SessionId::new(),
            "merge_pr",
            &json!({"token": "ghp_abcdefghijklmnop"}),
            "success",
            42,
            false,
        );
        assert_eq!(record.masked_args["token"], json!("ghp***op"));
        assert_eq!(record.status, "success");
        assert_eq!(record.latency_ms, 42);
    }
}
