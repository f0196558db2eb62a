//! Streaming-safe request-context middleware (spec.md §4.1), generalized
//! from `original_source/Cybersecurity-Agent/shared/request_context.py`'s
//! ASGI middleware. Axum's `tower::Layer`/`Service` pair is the idiomatic
//! Rust equivalent of that class-based ASGI middleware: it still wraps
//! every request, still works with SSE (nothing buffers the response
//! body), and still stamps `X-Request-Id` on the way out.

use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::response::Response;
use conclave_core::context::{with_context, RequestContext};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

#[derive(Clone)]
pub struct RequestContextLayer {
    service_name: Arc<str>,
}

impl RequestContextLayer {
    pub fn new(service_name: impl Into<Arc<str>>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S> Layer<S> for RequestContextLayer {
    type Service = RequestContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestContextService {
            inner,
            service_name: self.service_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestContextService<S> {
    inner: S,
    service_name: Arc<str>,
}

impl<S> Service<Request<Body>> for RequestContextService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let request_id = format!("{:x}", uuid::Uuid::new_v4().as_u128() >> 96);
        let session_id = extract_session_id(&req);
        let service_name = self.service_name.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let ctx = RequestContext::new(request_id.clone(), session_id.clone(), service_name.clone());
            let started = Instant::now();

            let result = with_context(ctx, inner.call(req)).await;

            let elapsed_ms = started.elapsed().as_millis();
            match &result {
                Ok(response) => {
                    tracing::info!(
                        service = %service_name,
                        %method,
                        %path,
                        status = response.status().as_u16(),
                        ms = elapsed_ms,
                        session_id = %session_id,
                        request_id = %request_id,
                        "http_request",
                    );
                }
                Err(_) => {
                    tracing::info!(
                        service = %service_name,
                        %method,
                        %path,
                        status = "?",
                        ms = elapsed_ms,
                        session_id = %session_id,
                        request_id = %request_id,
                        "http_request",
                    );
                }
            }

            result.map(|mut response| {
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response.headers_mut().insert("x-request-id", value);
                }
                response
            })
        })
    }
}

/// MCP session id, from the `session_id` query param or the
/// `X-Session-Id` header — matching
/// `request_context.py::_get_query_param` / `_get_header`'s precedence.
fn extract_session_id(req: &Request<Body>) -> String {
    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("session_id=") {
                return value.to_string();
            }
        }
    }
    req.headers()
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_query_param_over_header() {
        let req = Request::builder()
            .uri("/chat?session_id=from-query")
            .header("x-session-id", "from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_id(&req), "from-query");
    }

    #[test]
    fn falls_back_to_header_when_no_query_param() {
        let req = Request::builder()
            .uri("/chat")
            .header("x-session-id", "from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_id(&req), "from-header");
    }

    #[test]
    fn empty_when_neither_is_present() {
        let req = Request::builder().uri("/chat").body(Body::empty()).unwrap();
        assert_eq!(extract_session_id(&req), "");
    }
}
