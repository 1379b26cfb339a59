//! chainclient-http — HTTP JSON-RPC transport backed by `reqwest`.
//!
//! One POST per request; no retry of its own. Fallback and retry policy
//! belong to the dispatch engine in `chainclient-core`.

pub mod client;

pub use client::HttpTransport;
