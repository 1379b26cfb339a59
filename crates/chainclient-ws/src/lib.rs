//! chainclient-ws — WebSocket JSON-RPC transport with auto-reconnect.
//!
//! # Features
//! - Requests multiplexed over a single connection, matched by id
//! - Auto-reconnect on disconnect (capped exponential backoff)
//! - In-flight requests fail on disconnect instead of hanging, so the
//!   dispatch engine can fall back to another transport promptly

pub mod client;

pub use client::{WsConfig, WsTransport};
