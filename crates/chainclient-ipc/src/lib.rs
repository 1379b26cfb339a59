//! chainclient-ipc — IPC JSON-RPC transport over Unix domain sockets.
//!
//! Speaks the geth convention: one JSON-RPC envelope per newline-delimited
//! line. Unix only.

#[cfg(unix)]
pub mod client;

#[cfg(unix)]
pub use client::{IpcConfig, IpcTransport};
