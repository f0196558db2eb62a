//! The tool-call pipeline (spec.md §3 "Tool-Call Pipeline", §4.2):
//! validate → resolve missing parameters → approval check → cache lookup
//! → invoke → normalize → audit. Grounded in the sequencing of
//! `original_source/GitHub-Multi-Agent/shared/tooling.py::cached_tool_call`
//! / `uncached_tool_call`, generalized into one pipeline that branches on
//! `ToolDescriptor::cacheable` and `::requires_approval` instead of two
//! separate call sites.

use crate::audit;
use crate::registry::ToolRegistry;
use crate::resolver::{EntityLookup, ParameterResolver, ResolutionEvent};
use conclave_cache::key::build_tool_cache_key;
use conclave_cache::Cache;
use conclave_core::approval::{validate_approval_token, ApprovalError};
use conclave_core::envelope::normalize;
use conclave_core::error::CoreError;
use conclave_core::ids::{RequestId, SessionId};
use conclave_core::tool::{ArgKind, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub struct DispatchRequest<'a> {
    pub tool_name: &'a str,
    pub args: Value,
    pub session_id: SessionId,
    pub request_id: RequestId,
    pub approval_token: Option<&'a str>,
}

pub struct Dispatcher {
    pub registry: Arc<ToolRegistry>,
    pub cache: Arc<dyn Cache>,
    pub resolver: Arc<ParameterResolver>,
    pub lookup: Arc<dyn EntityLookup>,
    pub approval_secret: String,
    pub server_name: String,
    pub tool_version: String,
}

impl Dispatcher {
    /// Run the full pipeline for one tool call, then record an audit
    /// event regardless of outcome (spec.md §3 "record audit event" is
    /// the pipeline's final, mandatory step, not a side channel). Never
    /// panics; every failure path becomes a `CoreError` variant the
    /// transport layer maps to an HTTP status.
    pub async fn dispatch(&self, request: DispatchRequest<'_>) -> Result<ToolResult, CoreError> {
        let start = Instant::now();
        let request_id = request.request_id;
        let session_id = request.session_id;
        let tool_name = request.tool_name.to_string();
        let args_for_audit = request.args.clone();

        let result = self.run_pipeline(request).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let (status, cache_hit) = match &result {
            Ok(ToolResult::Success { cache, .. }) => ("success", cache.hit),
            Ok(ToolResult::Error { cache, .. }) => ("error", cache.hit),
            Err(_) => ("error", false),
        };
        let record = audit::build_record(request_id, session_id, &tool_name, &args_for_audit, status, duration_ms, cache_hit);
        audit::log_audit_event(&record);

        result
    }

    async fn run_pipeline(&self, request: DispatchRequest<'_>) -> Result<ToolResult, CoreError> {
        let start = Instant::now();
        let handler = self
            .registry
            .get(request.tool_name)
            .ok_or_else(|| CoreError::Validation(format!("unknown tool '{}'", request.tool_name)))?;
        let descriptor = handler.descriptor().clone();

        let filled_args = validate_args(&request.args, &descriptor)?;

        let (resolved_args, _events): (Value, Vec<ResolutionEvent>) =
            self.resolver.resolve(request.tool_name, &filled_args, self.lookup.as_ref()).await?;

        if descriptor.requires_approval {
            let token = request
                .approval_token
                .ok_or_else(|| CoreError::Auth("approval token required".to_string()))?;
            let now = chrono::Utc::now().timestamp();
            validate_approval_token(
                &self.approval_secret,
                token,
                request.tool_name,
                &resolved_args,
                &request.session_id.to_string(),
                now,
            )
            .map_err(approval_error_to_core)?;
        }

        let cache_key = descriptor
            .cacheable
            .then(|| build_tool_cache_key(&self.server_name, request.tool_name, &resolved_args, &self.tool_version));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key).await.map_err(|e| CoreError::Internal(e.to_string()))? {
                let duration_ms = start.elapsed().as_millis() as u64;
                return Ok(ToolResult::success(self.server_name.clone(), cached, duration_ms, true));
            }
        }

        let raw = handler.invoke(resolved_args.clone()).await?;
        let normalized = normalize(&raw);

        if let (Some(key), Some(ttl)) = (&cache_key, descriptor.cache_ttl) {
            self.cache
                .set(key, normalized.clone(), ttl)
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?;
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(ToolResult::success(self.server_name.clone(), normalized, duration_ms, false))
    }
}

fn approval_error_to_core(err: ApprovalError) -> CoreError {
    CoreError::Auth(err.to_string())
}

/// Check required args are present and, where present, type-match the
/// descriptor; reject any field the descriptor doesn't declare; fill
/// missing optional fields from `ArgSpec::default`. Returns the filled
/// args object, which is what resolution and the handler both see
/// (spec.md §4.2 step 1).
fn validate_args(args: &Value, descriptor: &conclave_core::tool::ToolDescriptor) -> Result<Value, CoreError> {
    let obj = args.as_object().ok_or_else(|| CoreError::Validation("args must be an object".to_string()))?;

    for name in obj.keys() {
        if !descriptor.args.contains_key(name) {
            return Err(CoreError::Validation(format!("unknown arg '{name}'")));
        }
    }

    let mut filled = obj.clone();
    for (name, spec) in &descriptor.args {
        match obj.get(name) {
            Some(value) if !spec.kind.matches(value) => {
                return Err(CoreError::Validation(format!("arg '{name}' has the wrong type, expected {spec_kind:?}", spec_kind = spec.kind)));
            }
            Some(_) => {}
            None if spec.required => {
                return Err(CoreError::Validation(format!("missing required arg '{name}'")));
            }
            None => {
                if let Some(default) = &spec.default {
                    filled.insert(name.clone(), default.clone());
                }
            }
        }
    }
    Ok(Value::Object(filled))
}
