//! JSON-RPC 2.0 wire types.
//!
//! The `result` member is carried as [`RawValue`] — uninterpreted JSON text —
//! so the dispatch layer never decodes payloads it only routes. Decoding into
//! typed values happens in `chainclient-eth`.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::TransportError;

/// Protocol version string carried in every request and response.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request ID — string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request with positional parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RpcId,
}

impl JsonRpcRequest {
    /// Create a request for `method` with the given numeric id.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response. The `result` member, when present, is kept as
/// raw JSON text.
///
/// A present `"result": null` and an absent `result` member are different
/// things on the wire (unknown receipts answer with a null result), so the
/// field uses a deserializer that keeps the raw `null` instead of collapsing
/// it into `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(default, deserialize_with = "raw_present", skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

fn raw_present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    /// Returns `true` if this response carries a result and no error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }

    /// Unwrap the raw result, turning an `error` member into
    /// [`TransportError::Rpc`]. A response with neither member is malformed.
    pub fn into_result(self) -> Result<Box<RawValue>, TransportError> {
        if let Some(err) = self.error {
            return Err(TransportError::Rpc(err));
        }
        match self.result {
            Some(raw) => Ok(raw),
            None => Err(TransportError::InvalidResponse(
                "response carries neither result nor error".into(),
            )),
        }
    }
}
