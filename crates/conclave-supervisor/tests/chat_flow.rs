//! Drives a full turn through `Orchestrator::handle_turn` against a real
//! specialist server: intent classification, a single-step plan, an MCP
//! call over HTTP, deterministic rendering, and session history.

use async_trait::async_trait;
use conclave_cache::memory::InMemoryCache;
use conclave_client::descriptor_cache::DescriptorCache;
use conclave_client::McpClient;
use conclave_core::error::CoreError;
use conclave_core::ids::SessionId;
use conclave_core::tool::{ArgKind, ArgSpec, ToolDescriptor};
use conclave_server::dispatch::Dispatcher;
use conclave_server::registry::{ToolHandler, ToolRegistry};
use conclave_server::resolver::{EntityLookup, ParameterResolver};
use conclave_server::transport::http::{app, AppState};
use conclave_supervisor::intent_router::{IntentRouter, IntentRule};
use conclave_supervisor::orchestrator::{Orchestrator, OrchestratorConfig};
use conclave_supervisor::plan::{PlanStep, PlanTable, ToolPlan};
use conclave_supervisor::session_store::{CompactionConfig, InMemorySessionStore};
use serde_json::{json, Value};
use std::sync::Arc;

struct EchoTool(ToolDescriptor);

#[async_trait]
impl ToolHandler for EchoTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.0
    }

    async fn invoke(&self, args: Value) -> Result<Value, CoreError> {
        Ok(args)
    }
}

struct NoLookup;

#[async_trait]
impl EntityLookup for NoLookup {
    async fn call(&self, _tool_name: &str, _args: Value) -> Result<Value, CoreError> {
        Err(CoreError::Internal("no lookups registered in this test".to_string()))
    }
}

async fn spawn_specialist() -> String {
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(EchoTool(
        ToolDescriptor::new("echo_tool", "echoes its args").with_arg("text", ArgSpec::optional(ArgKind::String, json!("default"))),
    )));

    let dispatcher = Dispatcher {
        registry,
        cache: Arc::new(InMemoryCache::new(64)),
        resolver: Arc::new(ParameterResolver::new(Vec::new())),
        lookup: Arc::new(NoLookup),
        approval_secret: "test-secret".to_string(),
        server_name: "test-specialist".to_string(),
        tool_version: "1".to_string(),
    };

    let state = Arc::new(AppState { dispatcher, service_name: Arc::from("test-specialist") });
    let router = app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

async fn build_orchestrator() -> Orchestrator {
    let endpoint = spawn_specialist().await;
    let descriptors = Arc::new(DescriptorCache::new());
    let client = Arc::new(McpClient::new(descriptors));
    client.discover("test-specialist", &endpoint).await;

    let router = IntentRouter::new(vec![IntentRule { intent: "demo", keywords: &["run the echo tool"] }]);
    let mut plans = PlanTable::new();
    plans.insert("demo".to_string(), ToolPlan(vec![PlanStep::new("echo_tool", json!({"text": "hello"}))]));

    Orchestrator::new(
        router,
        plans,
        client,
        Arc::new(InMemorySessionStore::new(CompactionConfig::default())),
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn a_full_turn_classifies_calls_and_renders() {
    let orchestrator = build_orchestrator().await;
    let session_id = SessionId::new();

    let outcome = orchestrator.handle_turn(session_id, "please run the echo tool now").await;

    assert!(outcome.reply.starts_with("Intent: demo"));
    assert!(outcome.reply.contains("echo_tool: success"));
    assert_eq!(outcome.trace.errors().count(), 0);

    let session = orchestrator.sessions.load(session_id).await;
    assert_eq!(session.history.len(), 2);
}

#[tokio::test]
async fn unmatched_messages_fall_back_to_direct_answer() {
    let orchestrator = build_orchestrator().await;
    let outcome = orchestrator.handle_turn(SessionId::new(), "what's the weather like").await;
    assert_eq!(outcome.reply, "Intent: direct_answer");
}

#[tokio::test]
async fn concurrent_turns_for_the_same_session_both_complete_and_persist() {
    let orchestrator = Arc::new(build_orchestrator().await);
    let session_id = SessionId::new();

    let a = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.handle_turn(session_id, "please run the echo tool now").await })
    };
    let b = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.handle_turn(session_id, "please run the echo tool again").await })
    };

    let (first, second) = tokio::join!(a, b);
    assert!(first.unwrap().reply.starts_with("Intent:"));
    assert!(second.unwrap().reply.starts_with("Intent:"));

    let session = orchestrator.sessions.load(session_id).await;
    assert_eq!(session.history.len(), 4, "both turns should have appended their user+assistant messages");
}
