//! Parameter resolution: filling in defaults and looking up referenced
//! entities before a tool call reaches its handler (spec.md §4.3),
//! generalized from
//! `original_source/GitHub-Multi-Agent/agents/github/resolver.py`. The
//! original hardcodes GitHub concepts (branch, workflow, run); this keeps
//! the *shape* of that resolution — "look a field up via another tool
//! call, record why" — and drives it from a configurable rule table
//! instead, so a non-GitHub specialist can reuse the same mechanism.

use async_trait::async_trait;
use conclave_core::error::CoreError;
use serde_json::Value;
use std::collections::BTreeMap;

/// A single missing-field rule: if `tool_name` is called without `field`
/// set, invoke `lookup_tool` with `lookup_args_from` taken from the
/// caller's own args, and write the first match's `result_field` into
/// `field`.
#[derive(Debug, Clone)]
pub struct ResolutionRule {
    pub tool_name: String,
    pub field: String,
    pub lookup_tool: String,
    /// Names of the caller's own args to forward to the lookup call
    /// unchanged (e.g. `["owner", "repo"]`).
    pub forward_args: Vec<String>,
    /// Field to read off the lookup result when it's a single object.
    pub result_field: String,
    /// Human-readable reason, with `{value}` substituted, attached to the
    /// emitted `ResolutionEvent`.
    pub message_template: String,
}

/// What actually got resolved, for the trace (spec.md §4.5 `Trace`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub tool: String,
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Abstraction over "call another tool and get its unwrapped data back",
/// matching the Python resolver's `tool_executor` callback exactly — one
/// method, domain-agnostic.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn call(&self, tool_name: &str, args: Value) -> Result<Value, CoreError>;
}

/// Unwrap a `{"data": ...}` envelope the way
/// `resolver.py::_unwrap_data` does, falling back to the value itself.
fn unwrap_data(result: &Value) -> Value {
    result.get("data").cloned().unwrap_or_else(|| result.clone())
}

pub struct ParameterResolver {
    rules: Vec<ResolutionRule>,
}

impl ParameterResolver {
    pub fn new(rules: Vec<ResolutionRule>) -> Self {
        Self { rules }
    }

    /// Resolve every applicable rule for `tool_name` against `args`,
    /// returning the updated args and the resolution events to append to
    /// the trace. Fails closed: any missing forwarded arg or an empty
    /// lookup result is a `ResolutionError`.
    pub async fn resolve(
        &self,
        tool_name: &str,
        args: &Value,
        lookup: &dyn EntityLookup,
    ) -> Result<(Value, Vec<ResolutionEvent>), CoreError> {
        let mut resolved = args.as_object().cloned().unwrap_or_default();
        let mut events = Vec::new();

        for rule in self.rules.iter().filter(|r| r.tool_name == tool_name) {
            if resolved.get(&rule.field).map(is_present).unwrap_or(false) {
                continue;
            }

            let mut lookup_args = serde_json::Map::new();
            for key in &rule.forward_args {
                let value = resolved.get(key).cloned().ok_or_else(|| {
                    CoreError::Resolution(format!("missing required field '{key}' to resolve '{}'", rule.field))
                })?;
                lookup_args.insert(key.clone(), value);
            }

            let response = lookup.call(&rule.lookup_tool, Value::Object(lookup_args)).await?;
            let data = unwrap_data(&response);

            let resolved_value = extract_result_field(&data, &rule.result_field).ok_or_else(|| {
                CoreError::Resolution(format!("could not resolve '{}' via '{}'", rule.field, rule.lookup_tool))
            })?;

            let message = rule.message_template.replace("{value}", &resolved_value);
            events.push(ResolutionEvent {
                tool: tool_name.to_string(),
                field: rule.field.clone(),
                value: resolved_value.clone(),
                message,
            });
            resolved.insert(rule.field.clone(), Value::String(resolved_value));
        }

        Ok((Value::Object(resolved), events))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Read `field` off `data`, whether it's a single object or (taking the
/// first element) a list of objects — covers both "resolve the one
/// default branch" and "pick the sole workflow" shapes from the original.
fn extract_result_field(data: &Value, field: &str) -> Option<String> {
    match data {
        Value::Object(_) => scalar_to_string(data.get(field)?),
        Value::Array(items) => {
            let first = items.first()?;
            scalar_to_string(first.get(field)?)
        }
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
