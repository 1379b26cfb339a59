//! HTTP JSON-RPC transport backed by `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::value::RawValue;
use serde_json::Value;

use chainclient_core::error::TransportError;
use chainclient_core::request::{JsonRpcRequest, JsonRpcResponse};
use chainclient_core::transport::Transport;

/// How long to wait for a TCP/TLS connection before giving up.
///
/// Kept well under typical dispatch timeouts so a dead endpoint fails its
/// round quickly and the client can fall through to the next transport.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP JSON-RPC transport.
///
/// Sends one POST per request and hands back the raw `result` payload.
/// There is no retry here — resilience policy lives in the dispatch engine.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for the given JSON-RPC endpoint URL.
    ///
    /// No connection is made until the first request.
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_connect_timeout(url, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a transport with a custom connect timeout.
    pub fn with_connect_timeout(
        url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        tracing::debug!(url = %self.url, method, id, "sending HTTP request");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let resp: JsonRpcResponse = serde_json::from_str(&body)?;
        resp.into_result()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
