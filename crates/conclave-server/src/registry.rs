//! Tool registry: the set of tools one specialist process exposes
//! (spec.md §3 "Tool Registry"), grounded in the teacher's
//! `infrastructure::tool_router::ToolRouter` capability index but
//! simplified to single-process scope — a specialist in this system is
//! one process serving its own fixed tool set, not a proxy fanning out to
//! many child servers.

use async_trait::async_trait;
use conclave_core::error::CoreError;
use conclave_core::tool::ToolDescriptor;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// One tool's executable behavior. Implementors return the raw payload;
/// the dispatcher wraps it in the `ToolResult` envelope.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;
    async fn invoke(&self, args: Value) -> Result<Value, CoreError>;
}

/// Process-lifetime map of tool name to handler. Registration happens
/// once at startup; lookups happen on every `tools/call`.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: DashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn ToolHandler>) {
        let name = handler.descriptor().name.clone();
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).map(|entry| entry.value().clone())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.handlers.iter().map(|entry| entry.value().descriptor().clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::tool::ToolDescriptor;
    use serde_json::json;

    struct Echo(ToolDescriptor);

    #[async_trait]
    impl ToolHandler for Echo {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.0
        }

        async fn invoke(&self, args: Value) -> Result<Value, CoreError> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn register_then_lookup_roundtrips() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(Echo(ToolDescriptor::new("echo", "echoes args"))));

        assert!(registry.contains("echo"));
        let handler = registry.get("echo").unwrap();
        let out = handler.invoke(json!({"a": 1})).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn descriptors_lists_all_registered_tools() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(Echo(ToolDescriptor::new("a", "a"))));
        registry.register(Arc::new(Echo(ToolDescriptor::new("b", "b"))));
        let mut names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
