//! Optional aria2 control-channel client (JSON-RPC 2.0 over HTTP).
//!
//! The control channel is advisory: it serves out-of-band status polling
//! and enqueueing for the accelerator engine, and its unavailability must
//! never block the direct-process execution path. Accordingly, every
//! transport or decoding failure here is a typed, logged event that
//! degrades to an absent result instead of an error the caller must
//! handle.

use std::fmt;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Round-trip timeout for control-channel calls.
const RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Request id tag sent with every call.
const RPC_CLIENT_ID: &str = "dlmux";

/// Typed failure of a control-channel round-trip.
///
/// Internal on purpose: failures are logged and degraded to `None` by
/// [`ControlChannel::call`], never surfaced to callers.
#[derive(Debug, Error)]
enum ControlChannelError {
    /// Connection, timeout, or body-decoding failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with something other than HTTP 200.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Stateless request/response client for the aria2 RPC service.
///
/// Construction requires an explicit shared secret; there is no default.
pub struct ControlChannel {
    http: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl fmt::Debug for ControlChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlChannel")
            .field("endpoint", &self.endpoint)
            .field("secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ControlChannel {
    /// Creates a client for the service at `http://localhost:<port>/jsonrpc`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(port: u16, secret: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            http,
            endpoint: format!("http://localhost:{port}/jsonrpc"),
            secret: secret.into(),
        }
    }

    /// Builds a client from config, or `None` when no secret is set.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .rpc_secret
            .as_ref()
            .map(|secret| Self::new(config.rpc_port, secret.clone()))
    }

    /// Makes one `aria2.<method>` call, returning the decoded response
    /// body on HTTP 200 and `None` on any failure.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Option<Value> {
        match self.try_call(method, params).await {
            Ok(body) => Some(body),
            Err(error) => {
                debug!(method, %error, "control channel unavailable");
                None
            }
        }
    }

    /// Fetches the engine's version string.
    pub async fn engine_version(&self) -> Option<String> {
        self.call("getVersion", Vec::new())
            .await?
            .get("result")?
            .get("version")?
            .as_str()
            .map(ToString::to_string)
    }

    /// Enqueues a URL with the engine, returning the opaque job id (GID).
    pub async fn enqueue(&self, url: &str, options: Option<Value>) -> Option<String> {
        let mut params = vec![json!([url])];
        if let Some(options) = options {
            params.push(options);
        }
        self.call("addUri", params)
            .await?
            .get("result")?
            .as_str()
            .map(ToString::to_string)
    }

    /// Fetches the status record of a previously enqueued job.
    pub async fn job_status(&self, gid: &str) -> Option<Value> {
        self.call("tellStatus", vec![json!(gid)])
            .await?
            .get("result")
            .cloned()
    }

    async fn try_call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ControlChannelError> {
        let payload = self.build_payload(method, params);
        let response = self.http.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ControlChannelError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Builds the JSON-RPC request body, injecting the bearer token as
    /// the first positional parameter the way aria2 expects.
    fn build_payload(&self, method: &str, params: Vec<Value>) -> Value {
        let mut full_params = vec![Value::String(format!("token:{}", self.secret))];
        full_params.extend(params);
        json!({
            "jsonrpc": "2.0",
            "id": RPC_CLIENT_ID,
            "method": format!("aria2.{method}"),
            "params": full_params,
        })
    }
}
