//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! NormalizedBody
//!     → RoutingDirective::extract (host/port/scheme/base_path removed)
//!     → target URL {scheme}://{host}:{port}{base_path}/{operation}
//!     → single outbound POST, remaining fields as JSON, fixed timeout
//!     → UpstreamResponse (relayed verbatim) or RelayError
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per inbound request; no retries, no failover
//! - Transport-level failures map to 502 upstream_request_failed
//! - Routing keys are consumed, never forwarded to the upstream

use std::time::Duration;

use axum::http::header;
use serde_json::Value;

use crate::http::response::{RelayError, UpstreamResponse};
use crate::normalize::NormalizedBody;

/// The two fixed upstream call kinds, differing only by URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Protect,
    Reveal,
}

impl Operation {
    /// URL path suffix for this operation.
    pub fn suffix(&self) -> &'static str {
        match self {
            Operation::Protect => "protect",
            Operation::Reveal => "reveal",
        }
    }
}

/// Routing directive extracted from a normalized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDirective {
    pub host: String,
    pub port: String,
    pub scheme: String,
    pub base_path: String,
}

impl RoutingDirective {
    /// Remove and validate the routing keys of a normalized body. The body
    /// keeps only the payload fields afterwards.
    pub fn extract(body: &mut NormalizedBody) -> Result<Self, RelayError> {
        let host = take_truthy(body, "host");
        let port = take_truthy(body, "port");
        let scheme = take_truthy(body, "scheme")
            .unwrap_or_else(|| "http".to_string())
            .to_lowercase();
        let base_path = take_truthy(body, "base_path").unwrap_or_else(|| "/v1".to_string());

        let (Some(host), Some(port)) = (host, port) else {
            return Err(RelayError::InvalidInput("host and port required".into()));
        };
        if scheme != "http" && scheme != "https" {
            return Err(RelayError::InvalidInput(
                "scheme must be http or https".into(),
            ));
        }
        let base_path = if base_path.starts_with('/') {
            base_path
        } else {
            format!("/{}", base_path)
        };

        Ok(Self {
            host,
            port,
            scheme,
            base_path,
        })
    }

    /// Outbound target URL for the given operation.
    pub fn target_url(&self, operation: Operation) -> String {
        format!(
            "{}://{}:{}{}/{}",
            self.scheme,
            self.host,
            self.port,
            self.base_path,
            operation.suffix()
        )
    }
}

/// Remove a key and render its value as text, treating empty and zero-like
/// values (null, false, 0, "") as absent.
fn take_truthy(body: &mut NormalizedBody, key: &str) -> Option<String> {
    match body.remove(key)? {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        }
        // Compound values render as JSON text; the resulting URL will simply
        // fail to resolve and surface as an upstream failure.
        other => Some(other.to_string()),
    }
}

/// Issues the single outbound call for a relayed request.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder with the configured per-call timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Forward one normalized body to the upstream named by its routing
    /// directive. Exactly one POST, no retries.
    pub async fn forward(
        &self,
        operation: Operation,
        mut body: NormalizedBody,
    ) -> Result<UpstreamResponse, RelayError> {
        let directive = RoutingDirective::extract(&mut body)?;
        let url = directive.target_url(operation);

        tracing::debug!(
            url = %url,
            operation = operation.suffix(),
            payload_fields = body.len(),
            "Forwarding to upstream"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamRequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::UpstreamRequestFailed(e.to_string()))?;

        tracing::debug!(status, content_type = %content_type, "Upstream responded");

        Ok(UpstreamResponse {
            status,
            content_type,
            body: bytes,
        })
    }
}
