//! chainclient-core — dispatch engine and foundation types for ChainClient.
//!
//! # Overview
//!
//! ChainClient is a multi-transport JSON-RPC client for Ethereum-compatible
//! nodes. The core crate defines:
//!
//! - [`Transport`] — the async trait every delivery mechanism implements
//! - [`Client`] / [`ClientBuilder`] — the dispatch engine: ordered fallback,
//!   bounded retry rounds, deadline enforcement
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] — wire types
//! - [`ConfigError`] / [`TransportError`] / [`ClientError`] — structured errors
//!
//! Transports live in their own crates (`chainclient-http`, `chainclient-ws`,
//! `chainclient-ipc`); typed Ethereum calls live in `chainclient-eth`.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::{
    Client, ClientBuilder, DEFAULT_POLLING_INTERVAL, DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT,
};
pub use error::{ClientError, ConfigError, TransportError};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, JSONRPC_VERSION};
pub use transport::Transport;
