//! The `Transport` trait, the abstraction every delivery mechanism implements.

use async_trait::async_trait;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::TransportError;

/// A single delivery mechanism for JSON-RPC requests.
///
/// Implementations own their connection details (URL, socket, reconnect
/// policy) and the JSON-RPC envelope: they assign request IDs, parse the
/// response envelope, and surface an embedded `error` member as
/// [`TransportError::Rpc`]. What comes back on success is the raw `result`
/// payload, uninterpreted.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and is stored as `Arc<dyn Transport>` by the
/// client.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one request for `method` with positional `params` and return the
    /// raw JSON `result` payload.
    async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, TransportError>;

    /// The transport's identifier (URL or socket path), used in logs.
    fn endpoint(&self) -> &str;
}
