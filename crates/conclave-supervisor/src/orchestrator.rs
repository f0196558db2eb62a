//! The turn state machine (spec.md §4.5): reason (classify + select
//! plan) -> act (execute plan steps, bounded concurrency for independent
//! ones) -> summarize (deterministic or LLM reply). Grounded in the
//! teacher's `domain::supervisor` turn-processing shape, generalized from
//! its single-agent dispatch to a fixed multi-step plan per intent.

use crate::intent_router::IntentRouter;
use crate::plan::{PlanTable, ToolPlan};
use crate::render::render_deterministic;
use crate::session_store::SessionStore;
use crate::trace::{Trace, TraceEvent};
use conclave_client::McpClient;
use conclave_core::artifact::{Artifact, ArtifactKind};
use conclave_core::error::CoreError;
use conclave_core::ids::SessionId;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, Semaphore};

pub struct OrchestratorConfig {
    pub max_concurrency: usize,
    pub tool_timeout_read: Duration,
    pub tool_timeout_mutating: Duration,
    pub turn_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            tool_timeout_read: Duration::from_secs(10),
            tool_timeout_mutating: Duration::from_secs(30),
            turn_timeout: Duration::from_secs(120),
        }
    }
}

pub struct TurnOutcome {
    pub reply: String,
    pub trace: Trace,
}

pub struct Orchestrator {
    pub router: IntentRouter,
    pub plans: PlanTable,
    pub client: Arc<McpClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: OrchestratorConfig,
    /// One lock per session, held for the duration of a turn. Two
    /// concurrent requests for the same session run one after the other
    /// instead of racing on shared history; unrelated sessions never
    /// block each other (spec.md §9 open question, resolved in
    /// DESIGN.md: same-session turns serialize).
    session_locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(
        router: IntentRouter,
        plans: PlanTable,
        client: Arc<McpClient>,
        sessions: Arc<dyn SessionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self { router, plans, client, sessions, config, session_locks: DashMap::new() }
    }

    fn lock_for(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        self.session_locks.entry(session_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Run one full turn. Never panics: tool failures become `Error`
    /// trace events, the turn still produces a reply. Concurrent calls
    /// for the same `session_id` are serialized; calls for different
    /// sessions run fully in parallel.
    pub async fn handle_turn(&self, session_id: SessionId, user_text: &str) -> TurnOutcome {
        self.handle_turn_inner(session_id, user_text, None).await
    }

    /// Same turn, but every `TraceEvent` is also pushed to `sink` the
    /// moment it's produced rather than only once the whole turn
    /// completes — lets a caller stream progress incrementally (spec.md
    /// line 157: "streaming endpoints must not buffer the full
    /// response").
    pub async fn handle_turn_streaming(
        &self,
        session_id: SessionId,
        user_text: &str,
        sink: UnboundedSender<TraceEvent>,
    ) -> TurnOutcome {
        self.handle_turn_inner(session_id, user_text, Some(&sink)).await
    }

    async fn handle_turn_inner(
        &self,
        session_id: SessionId,
        user_text: &str,
        sink: Option<&UnboundedSender<TraceEvent>>,
    ) -> TurnOutcome {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let outcome = tokio::time::timeout(self.config.turn_timeout, self.run_turn(session_id, user_text, sink)).await;

        match outcome {
            Ok(outcome) => outcome,
            Err(_) => {
                let mut trace = Trace::new();
                let event = TraceEvent::Error { tool: None, message: "turn exceeded the time budget".to_string() };
                push_event(&mut trace, sink, event);
                TurnOutcome { reply: "The request took too long and was stopped.".to_string(), trace }
            }
        }
    }

    async fn run_turn(&self, session_id: SessionId, user_text: &str, sink: Option<&UnboundedSender<TraceEvent>>) -> TurnOutcome {
        let mut trace = Trace::new();

        // Reason.
        let route = self.router.detect_intent(user_text);
        push_event(
            &mut trace,
            sink,
            TraceEvent::Route {
                intent: route.intent.to_string(),
                entities: serde_json::to_value(&route.entities).unwrap_or(Value::Null),
            },
        );

        let empty_plan = ToolPlan::default();
        let plan = self.plans.get(route.intent.as_str()).unwrap_or(&empty_plan);

        // Act.
        let results = self.execute_plan(plan, &route.entities, &mut trace, sink).await;

        for (tool, result) in &results {
            if let Some(artifact) = artifact_for_result(session_id, tool, result, &route.entities) {
                self.sessions.append_artifact(session_id, artifact).await;
            }
        }

        // Summarize.
        let artifacts = self.sessions.get_artifacts(session_id).await;
        let reply = render_deterministic(route.intent.as_str(), &trace.0, &artifacts);
        push_event(&mut trace, sink, TraceEvent::Reply { text: reply.clone() });

        self.sessions.append_turn(session_id, user_text, &reply).await;

        TurnOutcome { reply, trace }
    }

    /// Execute `plan`'s steps, running independent ones (no unresolved
    /// `depends_on`) concurrently up to `max_concurrency`, sequentially
    /// otherwise. A critical step's failure stops the remaining plan.
    async fn execute_plan(
        &self,
        plan: &ToolPlan,
        entities: &std::collections::HashMap<String, String>,
        trace: &mut Trace,
        sink: Option<&UnboundedSender<TraceEvent>>,
    ) -> Vec<(String, Result<Value, CoreError>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut done: HashSet<String> = HashSet::new();
        let mut results = Vec::new();
        let mut remaining: Vec<&crate::plan::PlanStep> = plan.0.iter().collect();

        while !remaining.is_empty() {
            let (ready, not_ready): (Vec<_>, Vec<_>) =
                remaining.into_iter().partition(|step| step.depends_on.iter().all(|dep| done.contains(dep)));

            if ready.is_empty() {
                // Dependency cycle or unresolved dependency; nothing more
                // can run. Record it and stop rather than spinning.
                for step in &not_ready {
                    push_event(
                        trace,
                        sink,
                        TraceEvent::Error { tool: Some(step.tool.clone()), message: "unresolved dependency, step skipped".to_string() },
                    );
                }
                break;
            }

            let mut handles = Vec::new();
            for step in &ready {
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
                let args = substitute_template(&step.args_template, entities);
                let client = self.client.clone();
                let tool = step.tool.clone();
                let timeout = self.config.tool_timeout_read;
                handles.push((step.critical, tool.clone(), args.clone(), tokio::spawn(async move {
                    let _permit = permit;
                    client.call_tool(&tool, args, timeout).await
                })));
            }

            let mut aborted = false;
            for (critical, tool, args, handle) in handles {
                let start = Instant::now();
                let result = handle.await.unwrap_or_else(|e| Err(CoreError::Internal(e.to_string())));
                let duration_ms = start.elapsed().as_millis() as u64;

                push_event(trace, sink, TraceEvent::ToolCall { tool: tool.clone(), args });
                match &result {
                    Ok(_) => push_event(
                        trace,
                        sink,
                        TraceEvent::ToolResult { tool: tool.clone(), status: "success".to_string(), duration_ms },
                    ),
                    Err(e) => {
                        push_event(trace, sink, TraceEvent::Error { tool: Some(tool.clone()), message: e.to_string() });
                        if critical {
                            aborted = true;
                        }
                    }
                }

                done.insert(tool.clone());
                results.push((tool, result));
            }

            if aborted {
                break;
            }
            remaining = not_ready;
        }

        results
    }
}

/// Push `event` onto `trace` and, if a streaming caller is listening,
/// forward it immediately. A closed receiver (the caller dropped the
/// stream) is not an error — the turn still runs to completion.
fn push_event(trace: &mut Trace, sink: Option<&UnboundedSender<TraceEvent>>, event: TraceEvent) {
    if let Some(sink) = sink {
        let _ = sink.send(event.clone());
    }
    trace.push(event);
}

/// Turn a successful `risk_engine` result into a `Risk` artifact,
/// carrying the turn's `cve`/`domain` entities alongside the score so a
/// later `session_analysis` turn can name what it's recommending without
/// re-running any tool (spec.md §8 Scenario C). Other tools don't feed
/// the "which should we fix first" follow-up, so they're left untouched.
fn artifact_for_result(
    session_id: SessionId,
    tool: &str,
    result: &Result<Value, CoreError>,
    entities: &std::collections::HashMap<String, String>,
) -> Option<Artifact> {
    if tool != "risk_engine" {
        return None;
    }
    let mut payload = result.as_ref().ok()?.as_object()?.clone();
    if let Some(cve) = entities.get("cve") {
        payload.insert("cve".to_string(), Value::String(cve.clone()));
    }
    if let Some(domain) = entities.get("domain") {
        payload.insert("domain".to_string(), Value::String(domain.clone()));
    }
    Some(Artifact::new(session_id, ArtifactKind::Risk, Value::Object(payload)))
}

/// Fill `{{entity_name}}` placeholders in a template value from the
/// turn's extracted entities. Leaves unresolvable placeholders as-is
/// rather than failing the whole plan — the tool call itself will reject
/// a missing required arg.
fn substitute_template(template: &Value, entities: &std::collections::HashMap<String, String>) -> Value {
    match template {
        Value::String(s) => {
            if let Some(name) = s.strip_prefix("{{").and_then(|s| s.strip_suffix("}}")) {
                if let Some(value) = entities.get(name) {
                    return Value::String(value.clone());
                }
            }
            Value::String(s.clone())
        }
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), substitute_template(v, entities))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_template(v, entities)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn substitutes_a_known_entity() {
        let mut entities = HashMap::new();
        entities.insert("cve".to_string(), "CVE-2021-44228".to_string());
        let template = json!({"cve": "{{cve}}", "literal": "x"});
        let filled = substitute_template(&template, &entities);
        assert_eq!(filled["cve"], json!("CVE-2021-44228"));
        assert_eq!(filled["literal"], json!("x"));
    }

    #[test]
    fn leaves_unknown_placeholders_untouched() {
        let entities = HashMap::new();
        let template = json!("{{missing}}");
        assert_eq!(substitute_template(&template, &entities), json!("{{missing}}"));
    }
}
