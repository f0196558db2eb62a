//! HTTP surface for one specialist: `POST /` (JSON-RPC `tools/list` /
//! `tools/call`) and `GET /health`, styled after the teacher's
//! `presentation::api::app` (axum `Router` + `AppState` behind an `Arc`,
//! state-extractor handlers returning `impl IntoResponse`).

use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::middleware::RequestContextLayer;
use crate::transport::jsonrpc::{content_envelope, JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use conclave_core::error::CoreError;
use conclave_core::ids::{RequestId, SessionId};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub service_name: Arc<str>,
}

pub fn app(state: Arc<AppState>) -> Router {
    let service_name = state.service_name.clone();
    Router::new()
        .route("/", post(handle_rpc))
        .route("/health", get(health))
        .with_state(state)
        .layer(RequestContextLayer::new(service_name))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn handle_rpc(State(state): State<Arc<AppState>>, Json(request): Json<JsonRpcRequest>) -> impl IntoResponse {
    match request.method.as_str() {
        "tools/list" => {
            let descriptors = state.dispatcher.registry.descriptors();
            let response = JsonRpcResponse::success(request.id, json!({"tools": descriptors}));
            (StatusCode::OK, Json(response))
        }
        "tools/call" => handle_tool_call(&state, request).await,
        other => {
            let response = JsonRpcResponse::error(request.id, -32601, format!("unknown method '{other}'"));
            (StatusCode::BAD_REQUEST, Json(response))
        }
    }
}

/// Dispatches the call and returns the real HTTP status alongside the
/// JSON-RPC body: `CoreError::http_status()` drives the former, so an
/// `Auth` failure is a genuine 401 and not a 200 with an error payload
/// (spec.md §7).
async fn handle_tool_call(state: &AppState, request: JsonRpcRequest) -> (StatusCode, Json<JsonRpcResponse>) {
    let params: ToolCallParams = match serde_json::from_value(request.params) {
        Ok(p) => p,
        Err(e) => {
            let response = JsonRpcResponse::error(request.id, -32602, format!("invalid params: {e}"));
            return (StatusCode::BAD_REQUEST, Json(response));
        }
    };

    let session_id = params
        .session_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(SessionId::from)
        .unwrap_or_else(SessionId::new);

    let result = state
        .dispatcher
        .dispatch(DispatchRequest {
            tool_name: &params.name,
            args: params.arguments,
            session_id,
            request_id: RequestId::new(),
            approval_token: params.approval_token.as_deref(),
        })
        .await;

    match result {
        Ok(tool_result) => {
            let payload = serde_json::to_value(&tool_result).expect("ToolResult always serializes");
            let response = JsonRpcResponse::success(request.id, content_envelope(&payload));
            (StatusCode::OK, Json(response))
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let response = JsonRpcResponse::error(request.id, error_code(&err), err.to_string());
            (status, Json(response))
        }
    }
}

fn error_code(err: &CoreError) -> i32 {
    match err {
        CoreError::Validation(_) => -32602,
        CoreError::Auth(_) => -32001,
        CoreError::Resolution(_) => -32002,
        CoreError::UpstreamTransient(_) => -32003,
        CoreError::UpstreamPermanent(_) => -32004,
        CoreError::Internal(_) => -32603,
    }
}
