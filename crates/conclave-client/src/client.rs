//! `McpClient`: calls a tool on whichever endpoint serves it, retrying
//! transient failures and normalizing the result (spec.md §4.6), ported
//! from
//! `original_source/GitHub-Multi-Agent/shared/github_client.py::GitHubClient.request`
//! generalized from the GitHub REST API to any MCP JSON-RPC endpoint.

use crate::descriptor_cache::DescriptorCache;
use crate::retry::RetryPolicy;
use conclave_core::envelope::normalize;
use conclave_core::error::CoreError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub struct McpClient {
    http: reqwest::Client,
    descriptors: Arc<DescriptorCache>,
    retry: RetryPolicy,
}

impl McpClient {
    pub fn new(descriptors: Arc<DescriptorCache>) -> Self {
        Self {
            http: reqwest::Client::new(),
            descriptors,
            retry: RetryPolicy::default(),
        }
    }

    /// Best-effort descriptor load: a dead endpoint is logged and
    /// skipped, never fatal to startup (spec.md §4.6).
    pub async fn discover(&self, name: &str, endpoint: &str) {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}});
        match self.http.post(endpoint).json(&body).send().await {
            Ok(resp) => match resp.json::<Value>().await {
                Ok(value) => {
                    let tools: Vec<conclave_core::tool::ToolDescriptor> =
                        serde_json::from_value(value["result"]["tools"].clone()).unwrap_or_default();
                    tracing::info!(server = name, endpoint, tool_count = tools.len(), "mcp_server_discovered");
                    self.descriptors.install(endpoint, tools);
                }
                Err(e) => tracing::warn!(server = name, endpoint, error = %e, "mcp_descriptor_decode_failed"),
            },
            Err(e) => tracing::warn!(server = name, endpoint, error = %e, "mcp_server_unreachable"),
        }
    }

    pub fn endpoint_for(&self, tool_name: &str) -> Option<String> {
        self.descriptors.endpoint_for(tool_name)
    }

    /// Call `tool_name` with `args`, retrying 429/5xx/network errors with
    /// backoff, never retrying 401/403/404, and normalizing whatever
    /// shape the server hands back.
    pub async fn call_tool(&self, tool_name: &str, args: Value, timeout: Duration) -> Result<Value, CoreError> {
        let endpoint = self
            .endpoint_for(tool_name)
            .ok_or_else(|| CoreError::UpstreamPermanent(format!("no endpoint serves tool '{tool_name}'")))?;

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": tool_name, "arguments": args},
        });

        let mut attempt = 1;
        loop {
            let sent = tokio::time::timeout(timeout, self.http.post(&endpoint).json(&body).send()).await;

            let response = match sent {
                Err(_) => return Err(CoreError::UpstreamTransient(format!("timed out calling '{tool_name}'"))),
                Ok(Err(e)) => {
                    if self.retry.is_last_attempt(attempt) {
                        return Err(CoreError::UpstreamTransient(format!("network error: {e}")));
                    }
                    tokio::time::sleep(self.retry.backoff_for(attempt)).await;
                    attempt += 1;
                    continue;
                }
                Ok(Ok(resp)) => resp,
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                if self.retry.is_last_attempt(attempt) {
                    return Err(CoreError::UpstreamTransient(format!("rate limited by '{tool_name}'")));
                }
                tokio::time::sleep(self.retry.backoff_for_429(attempt, retry_after)).await;
                attempt += 1;
                continue;
            }

            if (500..600).contains(&status) {
                if self.retry.is_last_attempt(attempt) {
                    return Err(CoreError::UpstreamTransient(format!("server error ({status}) from '{tool_name}'")));
                }
                tokio::time::sleep(self.retry.backoff_for(attempt)).await;
                attempt += 1;
                continue;
            }

            if status == 401 || status == 403 {
                return Err(CoreError::UpstreamPermanent(format!("authorization failed ({status})")));
            }
            if status == 404 {
                return Err(CoreError::UpstreamPermanent(format!("tool '{tool_name}' not found (404)")));
            }
            if status >= 400 {
                return Err(CoreError::UpstreamPermanent(format!("client error ({status}) from '{tool_name}'")));
            }

            let value: Value = response
                .json()
                .await
                .map_err(|e| CoreError::UpstreamTransient(format!("invalid response body: {e}")))?;

            if let Some(error) = value.get("error") {
                let message = error.get("message").and_then(|m| m.as_str()).unwrap_or("tool call failed");
                return Err(CoreError::UpstreamPermanent(message.to_string()));
            }

            return Ok(normalize(&value["result"]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_tool_fails_fast_when_no_endpoint_serves_it() {
        let client = McpClient::new(Arc::new(DescriptorCache::new()));
        let result = client.call_tool("missing_tool", json!({}), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(CoreError::UpstreamPermanent(_))));
    }
}
