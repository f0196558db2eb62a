//! The supervisor's HTTP surface (spec.md §6): `/chat`, `/chat/stream`
//! (SSE), `/chat/history/{id}`, `/health`. Styled after the teacher's
//! `presentation::api` (axum `Router`, `Arc<AppState>`, `Sse` for
//! streaming replies).

use crate::orchestrator::Orchestrator;
use crate::rate_limit::SessionRateLimiter;
use crate::trace::TraceEvent;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use conclave_core::ids::SessionId;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

pub struct AppState {
    pub orchestrator: Orchestrator,
    /// When set, every `/chat*` request must carry a matching
    /// `X-API-Key` header (spec.md §6). `None` disables the check —
    /// the same "only enforced when configured" shape as the teacher's
    /// optional auth middleware.
    pub api_key: Option<String>,
    /// Per-session request throttling (spec.md line 156). `None`
    /// disables the check, same shape as `api_key`.
    pub rate_limiter: Option<SessionRateLimiter>,
}

pub fn app(state: Arc<AppState>) -> Router {
    let chat_routes = Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route("/chat/history/:id", get(chat_history))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new().merge(chat_routes).route("/health", get(health)).with_state(state)
}

async fn require_api_key(State(state): State<Arc<AppState>>, request: Request, next: Next) -> impl IntoResponse {
    let Some(expected) = &state.api_key else {
        return next.run(request).await;
    };

    let provided = request.headers().get("x-api-key").and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing or invalid X-API-Key"}))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

fn resolve_session_id(raw: &Option<String>) -> SessionId {
    raw.as_deref().and_then(|s| Uuid::parse_str(s).ok()).map(SessionId::from).unwrap_or_else(SessionId::new)
}

/// `429` with a `Retry-After` header when the session has exceeded its
/// quota, matching spec.md line 156; `None` otherwise.
fn rate_limit_response(state: &AppState, session_id: SessionId) -> Option<axum::response::Response> {
    let limiter = state.rate_limiter.as_ref()?;
    let retry_after = limiter.check(&session_id.to_string()).err()?;
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "rate limit exceeded"}))).into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
        response.headers_mut().insert("retry-after", value);
    }
    Some(response)
}

async fn chat(State(state): State<Arc<AppState>>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    let session_id = resolve_session_id(&request.session_id);
    if let Some(limited) = rate_limit_response(&state, session_id) {
        return limited;
    }
    let outcome = state.orchestrator.handle_turn(session_id, &request.message).await;
    Json(json!({
        "session_id": session_id.to_string(),
        "reply": outcome.reply,
        "trace": outcome.trace.0,
    }))
    .into_response()
}

/// Names an SSE event per spec.md §6/SPEC_FULL.md §6's required set:
/// `start`, `tool_call`, `tool_result`, `parameter_resolved`, `output`,
/// `final_output`, `end`. `Route` and `Error` both surface as `output` —
/// neither has a dedicated name in that set, and both are informational
/// rather than the turn's final text.
fn trace_event_to_sse(event: TraceEvent) -> Event {
    let data = serde_json::to_string(&event).unwrap_or_default();
    match event {
        TraceEvent::ToolCall { .. } => Event::default().event("tool_call").data(data),
        TraceEvent::ToolResult { .. } => Event::default().event("tool_result").data(data),
        TraceEvent::ParameterResolved { .. } => Event::default().event("parameter_resolved").data(data),
        TraceEvent::Reply { text } => Event::default().event("final_output").data(text),
        TraceEvent::Route { .. } | TraceEvent::Error { .. } => Event::default().event("output").data(data),
    }
}

/// Streams trace events as `execute_plan` produces them rather than
/// buffering the whole turn first (spec.md line 157): the turn runs on
/// its own task, forwarding each `TraceEvent` over an unbounded channel
/// the instant it's pushed, bracketed by a literal `start` event before
/// the turn begins and `end` once the channel closes.
async fn chat_stream(State(state): State<Arc<AppState>>, Json(request): Json<ChatRequest>) -> axum::response::Response {
    let session_id = resolve_session_id(&request.session_id);
    if let Some(limited) = rate_limit_response(&state, session_id) {
        return limited;
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let message = request.message.clone();
    tokio::spawn(async move {
        state.orchestrator.handle_turn_streaming(session_id, &message, tx).await;
    });

    let start = stream::once(async { Ok::<_, Infallible>(Event::default().event("start").data("{}")) });
    let body = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(trace_event_to_sse(event)));
    let end = stream::once(async { Ok::<_, Infallible>(Event::default().event("end").data("{}")) });

    Sse::new(start.chain(body).chain(end)).keep_alive(KeepAlive::default()).into_response()
}

async fn chat_history(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(uuid) = Uuid::parse_str(&id) else {
        return Json(json!({"error": "invalid session id"}));
    };
    let session_id = SessionId::from(uuid);
    let session = state.orchestrator.sessions.load(session_id).await;
    Json(json!({
        "session_id": session_id.to_string(),
        "summary": session.summary.as_str(),
        "history": session.history,
    }))
}
