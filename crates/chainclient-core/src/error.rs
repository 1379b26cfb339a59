//! Error types for client construction, transports, and dispatch.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors raised while validating client configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The transport list was empty.
    #[error("at least one transport required")]
    NoTransports,

    /// The request timeout was zero.
    #[error("timeout must be positive")]
    InvalidTimeout,

    /// The retry polling interval was zero.
    #[error("polling interval must be positive")]
    InvalidPollingInterval,
}

/// Errors that can occur during a single transport attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// IPC socket connection/read/write error.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Response did not match the JSON-RPC envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request or response could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns `true` if the node was reached and answered with a JSON-RPC
    /// error object rather than failing at the connection level.
    pub fn is_rpc(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}

/// Errors returned by [`Client`](crate::Client) dispatch.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The overall deadline elapsed before any transport succeeded.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Every transport failed in every round.
    #[error("request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of rounds attempted (initial try plus retries).
        attempts: u32,
        /// The error from the last transport tried.
        #[source]
        source: TransportError,
    },
}

impl ClientError {
    /// The transport error from the final attempt, if retries were exhausted.
    pub fn last_error(&self) -> Option<&TransportError> {
        match self {
            Self::RetriesExhausted { source, .. } => Some(source),
            Self::DeadlineExceeded => None,
        }
    }
}
