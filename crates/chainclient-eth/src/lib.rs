//! chainclient-eth — typed Ethereum JSON-RPC surface for ChainClient.
//!
//! Wraps a core dispatch [`Client`](chainclient_core::Client) with:
//!
//! - [`EthClient`] — one async method per `eth_*`/`net_*`/`web3_*` wire
//!   method, plus a raw passthrough for everything else
//! - [`decode`] — pure functions turning raw responses into typed values
//! - [`types`] — response structs (`Block`, `TransactionReceipt`, …) and the
//!   typed [`CallRequest`] call object, built on alloy primitives
//! - [`WalletClient`] — local-key signing: EIP-1559 sends, EIP-191 personal
//!   messages, EIP-712 typed data
//! - [`AccessListBuilder`] — EIP-2930 access list accumulation

pub mod access_list;
pub mod block_tag;
pub mod client;
pub mod decode;
pub mod methods;
pub mod types;
pub mod wallet;

pub use access_list::AccessListBuilder;
pub use block_tag::{BlockNumberOrTag, BlockTag};
pub use client::{EthClient, EthError};
pub use decode::DecodeError;
pub use types::{
    Block, BlockTransactions, CallRequest, FeeHistory, Log, SyncProgress, SyncStatus, Transaction,
    TransactionReceipt,
};
pub use wallet::{typed_data_hash, WalletClient, WalletError};
