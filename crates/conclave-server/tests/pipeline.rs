//! End-to-end exercise of the HTTP transport against the real dispatch
//! pipeline: `tools/list`, a cached `tools/call`, a validation failure,
//! and an approval-gated tool rejected without a token. Complements the
//! in-module `dispatch` unit tests, which exercise the pipeline directly
//! without going over HTTP.

use async_trait::async_trait;
use conclave_cache::memory::InMemoryCache;
use conclave_core::error::CoreError;
use conclave_core::tool::{ArgKind, ArgSpec, ToolDescriptor};
use conclave_server::dispatch::Dispatcher;
use conclave_server::registry::{ToolHandler, ToolRegistry};
use conclave_server::resolver::{EntityLookup, ParameterResolver};
use conclave_server::transport::http::{app, AppState};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Echo {
    descriptor: ToolDescriptor,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolHandler for Echo {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, args: Value) -> Result<Value, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(args)
    }
}

struct NoLookup;

#[async_trait]
impl EntityLookup for NoLookup {
    async fn call(&self, _tool_name: &str, _args: Value) -> Result<Value, CoreError> {
        Err(CoreError::Internal("no lookups configured in this test".to_string()))
    }
}

async fn spawn_test_server(calls: Arc<AtomicUsize>) -> String {
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(Echo {
        descriptor: ToolDescriptor::new("echo", "echoes args")
            .with_arg("text", ArgSpec::required(ArgKind::String))
            .cacheable(std::time::Duration::from_secs(60)),
        calls: calls.clone(),
    }));
    registry.register(Arc::new(Echo {
        descriptor: ToolDescriptor::new("dangerous", "requires approval").mutating().requires_approval(),
        calls,
    }));

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

#[tokio::test]
async fn tools_list_reports_every_registered_tool() {
    let base = spawn_test_server(Arc::new(AtomicUsize::new(0))).await;
    let client = reqwest::Client::new();

    let resp: Value = client
        .post(&base)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let tools = resp["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"echo"));
    assert!(names.contains(&"dangerous"));
}

#[tokio::test]
async fn second_identical_call_is_served_from_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base = spawn_test_server(calls.clone()).await;
    let client = reqwest::Client::new();

    let body = json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": {"name": "echo", "arguments": {"text": "hi"}},
    });

    let first: Value = client.post(&base).json(&body).send().await.unwrap().json().await.unwrap();
    let second: Value = client.post(&base).json(&body).send().await.unwrap().json().await.unwrap();

    assert!(first["result"].is_object());
    assert!(second["result"].is_object());
    assert_eq!(calls.load(Ordering::SeqCst), 1, "handler should run once, second call served from cache");
}

#[tokio::test]
async fn missing_required_arg_is_rejected() {
    let base = spawn_test_server(Arc::new(AtomicUsize::new(0))).await;
    let client = reqwest::Client::new();

    let resp: Value = client
        .post(&base)
        .json(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "echo", "arguments": {}},
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(resp.get("error").is_some());
}

#[tokio::test]
async fn mutating_tool_without_approval_token_is_rejected() {
    let base = spawn_test_server(Arc::new(AtomicUsize::new(0))).await;
    let client = reqwest::Client::new();

    let resp: Value = client
        .post(&base)
        .json(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "dangerous", "arguments": {}},
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(resp.get("error").is_some());
}
