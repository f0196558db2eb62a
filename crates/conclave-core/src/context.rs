//! Per-request identity, propagated through the stack without threading an
//! explicit parameter through every call (spec.md §4.1 "Request Context"),
//! ported from
//! `original_source/Cybersecurity-Agent/shared/request_context.py`'s
//! `ContextVar`-based design. `tokio::task_local!` is the async-Rust
//! equivalent of a Python `ContextVar`: scoped to the current task tree,
//! invisible to sibling tasks.
//!
//! The ASGI middleware that populates this per HTTP request lives in
//! `conclave_server` (it needs `axum` types this crate doesn't depend on);
//! this module only owns the shape and the accessors.

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub session_id: String,
    pub service_name: Arc<str>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, session_id: impl Into<String>, service_name: Arc<str>) -> Self {
        Self {
            request_id: request_id.into(),
            session_id: session_id.into(),
            service_name,
        }
    }
}

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// Run `f` with `ctx` installed as the ambient request context for the
/// duration of the future. Nested calls shadow the outer context.
pub async fn with_context<F, T>(ctx: RequestContext, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CURRENT.scope(ctx, f).await
}

/// Read the current request id, or `""` outside of any request scope —
/// mirrors the Python `ContextVar` default of `""` rather than panicking,
/// since background tasks and tests legitimately run without one.
pub fn request_id() -> String {
    CURRENT
        .try_with(|ctx| ctx.request_id.clone())
        .unwrap_or_default()
}

pub fn session_id() -> String {
    CURRENT
        .try_with(|ctx| ctx.session_id.clone())
        .unwrap_or_default()
}

pub fn service_name() -> Arc<str> {
    CURRENT
        .try_with(|ctx| ctx.service_name.clone())
        .unwrap_or_else(|_| Arc::from(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn context_is_visible_inside_scope_and_absent_outside() {
        assert_eq!(request_id(), "");

        let ctx = RequestContext::new("req-1", "sess-1", Arc::from("conclave-server"));
        with_context(ctx, async {
            assert_eq!(request_id(), "req-1");
            assert_eq!(session_id(), "sess-1");
            assert_eq!(&*service_name(), "conclave-server");
        })
        .await;

        assert_eq!(request_id(), "");
    }

    #[tokio::test]
    async fn nested_scopes_shadow_the_outer_context() {
        let outer = RequestContext::new("req-outer", "sess-outer", Arc::from("svc"));
        with_context(outer, async {
            assert_eq!(request_id(), "req-outer");
            let inner = RequestContext::new("req-inner", "sess-inner", Arc::from("svc"));
            with_context(inner, async {
                assert_eq!(request_id(), "req-inner");
            })
            .await;
            assert_eq!(request_id(), "req-outer");
        })
        .await;
    }
}
