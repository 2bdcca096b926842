//! Outbound HTTP executor
//!
//! Issues a single HTTP call described by the node configuration. The
//! output carries the response status, headers, body, and wall clock;
//! JSON bodies are parsed when the content type says so.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for HttpExecutor {
    fn type_name(&self) -> &str {
        "http"
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        let url = config
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidInput(format!("http node '{}' requires a 'url'", node_id)))?;

        let method_str = config
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_uppercase();
        let method = Method::from_bytes(method_str.as_bytes()).map_err(|_| {
            EngineError::InvalidInput(format!(
                "http node '{}' has an invalid method '{}'",
                node_id, method_str
            ))
        })?;

        let timeout = config
            .get("timeout")
            .and_then(Value::as_u64)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let mut request = self.client.request(method, url).timeout(timeout);

        if let Some(headers) = config.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.header(name, value);
            }
        }

        if let Some(body) = config.get("body") {
            if !body.is_null() {
                request = request.json(body);
            }
        }

        debug!(node_id, url, "dispatching http request");
        let started = Instant::now();
        let response = request.send().await.map_err(|e| EngineError::ExecutorFailed {
            node: node_id.to_string(),
            message: format!("request to {} failed: {}", url, e),
        })?;

        let status = response.status().as_u16();
        let mut headers = JsonMap::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            );
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        let text = response.text().await.map_err(|e| EngineError::ExecutorFailed {
            node: node_id.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        let body = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        Ok(json!({
            "status": status,
            "headers": headers,
            "body": body,
            "duration_ms": started.elapsed().as_millis() as u64,
        }))
    }
}
