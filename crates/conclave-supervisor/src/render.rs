//! The "summarize" stage of reason -> act -> summarize (spec.md §4.5):
//! a deterministic, fixed-layout-per-intent renderer, used whenever no
//! LLM is configured. Grounded in the teacher's pluggable-model seam
//! (`orchestrator/core/src/infrastructure/llm/registry.rs`) — the trait
//! exists so a deployment can plug a real summarizer in, but no
//! implementation of one ships here (out of scope per spec Non-goals).

use crate::trace::TraceEvent;
use async_trait::async_trait;
use conclave_core::artifact::{Artifact, ArtifactKind};

/// A pluggable turn summarizer. Never implemented in this crate; the
/// deterministic renderer below is the only summarizer this control
/// plane ships.
#[async_trait]
pub trait LlmSummarizer: Send + Sync {
    async fn summarize(&self, intent: &str, trace: &[TraceEvent]) -> String;
}

/// Render a one-paragraph reply with no model involved. `session_analysis`
/// has no tool calls of its own (spec.md §8 Scenario C: "which should we
/// fix first" carries no CVE/domain to re-run `risk_engine` against) — it
/// answers from `artifacts` recorded by earlier turns instead. Every other
/// intent renders from `trace`: the intent line, then one line per
/// successful tool result, then a line per error. Same inputs, same
/// reply — no randomness, no I/O.
pub fn render_deterministic(intent: &str, trace: &[TraceEvent], artifacts: &[Artifact]) -> String {
    if intent == "session_analysis" {
        return render_session_analysis(artifacts);
    }

    let mut lines = vec![format!("Intent: {intent}")];

    for event in trace {
        match event {
            TraceEvent::ToolResult { tool, status, duration_ms } => {
                lines.push(format!("- {tool}: {status} ({duration_ms}ms)"));
            }
            TraceEvent::Error { tool, message } => match tool {
                Some(tool) => lines.push(format!("- {tool} failed: {message}")),
                None => lines.push(format!("- error: {message}")),
            },
            _ => {}
        }
    }

    lines.join("\n")
}

/// Rank this session's `Risk` artifacts by `risk_score` and name the
/// highest. Every artifact carries its own `cve`/`domain` context, so this
/// never needs to re-resolve the current turn's (typically absent)
/// entities.
fn render_session_analysis(artifacts: &[Artifact]) -> String {
    let best = artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Risk)
        .filter_map(|a| a.numeric_field("risk_score").map(|score| (score, a)))
        .max_by(|(a, _), (b, _)| a.total_cmp(b));

    let Some((score, artifact)) = best else {
        return "Intent: session_analysis\n- no risk assessments recorded yet this session".to_string();
    };

    let cve = artifact.payload.get("cve").and_then(|v| v.as_str()).unwrap_or("an unspecified item");
    let tier = artifact.payload.get("risk_tier").and_then(|v| v.as_str()).unwrap_or("unknown");
    format!("Intent: session_analysis\n- fix {cve} first: risk_score {score} ({tier}), the highest recorded this session")
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::ids::SessionId;
    use serde_json::json;

    #[test]
    fn renders_one_line_per_tool_result_and_error() {
        let trace = vec![
            TraceEvent::ToolResult { tool: "cvss_lookup".to_string(), status: "success".to_string(), duration_ms: 12 },
            TraceEvent::Error { tool: Some("kev_lookup".to_string()), message: "timed out".to_string() },
        ];
        let reply = render_deterministic("risk_assessment", &trace, &[]);
        assert!(reply.starts_with("Intent: risk_assessment"));
        assert!(reply.contains("cvss_lookup: success (12ms)"));
        assert!(reply.contains("kev_lookup failed: timed out"));
    }

    #[test]
    fn renders_just_the_intent_line_for_an_empty_trace() {
        assert_eq!(render_deterministic("direct_answer", &[], &[]), "Intent: direct_answer");
    }

    #[test]
    fn is_deterministic_for_the_same_trace() {
        let trace = vec![TraceEvent::ToolResult { tool: "a".to_string(), status: "success".to_string(), duration_ms: 1 }];
        assert_eq!(render_deterministic("x", &trace, &[]), render_deterministic("x", &trace, &[]));
    }

    #[test]
    fn session_analysis_picks_the_highest_risk_score() {
        let session_id = SessionId::new();
        let artifacts = vec![
            Artifact::new(session_id, ArtifactKind::Risk, json!({"cve": "CVE-2021-1", "risk_score": 20.0, "risk_tier": "medium"})),
            Artifact::new(session_id, ArtifactKind::Risk, json!({"cve": "CVE-2021-2", "risk_score": 88.0, "risk_tier": "critical"})),
        ];
        let reply = render_deterministic("session_analysis", &[], &artifacts);
        assert!(reply.contains("CVE-2021-2"));
        assert!(reply.contains("88"));
    }

    #[test]
    fn session_analysis_with_no_artifacts_says_so() {
        let reply = render_deterministic("session_analysis", &[], &[]);
        assert!(reply.contains("no risk assessments recorded"));
    }
}
