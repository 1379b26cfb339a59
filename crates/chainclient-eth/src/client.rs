//! Typed method wrappers over the dispatch engine.
//!
//! One async method per wire method. Each wrapper builds the positional
//! parameter list, hands the call to [`Client`] (which owns all retry and
//! fallback behavior), and decodes the raw result. Nothing here retries.

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use chainclient_core::{Client, ClientError};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{json, Value};
use thiserror::Error;

use crate::block_tag::BlockNumberOrTag;
use crate::decode::{self, DecodeError};
use crate::methods;
use crate::types::{Block, CallRequest, FeeHistory, SyncStatus, Transaction, TransactionReceipt};

/// Errors from a typed method call: either the dispatch failed or the
/// payload would not decode.
#[derive(Debug, Error)]
pub enum EthError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Shape of a successful `eth_createAccessList` result. The node reports
/// execution failure inside the result rather than as an RPC error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessListResult {
    #[serde(default)]
    access_list: AccessList,
    #[serde(default)]
    error: Option<String>,
}

/// Ethereum JSON-RPC methods over a multi-transport [`Client`].
#[derive(Debug, Clone)]
pub struct EthClient {
    client: Client,
}

impl EthClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying dispatch client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send an arbitrary method and get the raw `result` payload back.
    /// Escape hatch for methods without a typed wrapper.
    pub async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, EthError> {
        Ok(self.client.request(method, params).await?)
    }

    // Account / contract state

    /// Balance of `address` in wei. `block` defaults to `latest`.
    pub async fn get_balance(
        &self,
        address: Address,
        block: Option<BlockNumberOrTag>,
    ) -> Result<U256, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_BALANCE,
                vec![json!(address), json!(block.unwrap_or_default())],
            )
            .await?;
        Ok(decode::u256(&raw)?)
    }

    /// Nonce of `address`. `block` defaults to `latest`; pass
    /// `BlockTag::Pending` to include queued transactions.
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockNumberOrTag>,
    ) -> Result<u64, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_TRANSACTION_COUNT,
                vec![json!(address), json!(block.unwrap_or_default())],
            )
            .await?;
        Ok(decode::u64(&raw)?)
    }

    /// Deployed bytecode at `address`.
    pub async fn get_code(
        &self,
        address: Address,
        block: Option<BlockNumberOrTag>,
    ) -> Result<Bytes, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_CODE,
                vec![json!(address), json!(block.unwrap_or_default())],
            )
            .await?;
        Ok(decode::json(&raw)?)
    }

    /// Storage word of `address` at `slot`.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<BlockNumberOrTag>,
    ) -> Result<B256, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_STORAGE_AT,
                vec![json!(address), json!(slot), json!(block.unwrap_or_default())],
            )
            .await?;
        Ok(decode::b256(&raw)?)
    }

    /// Execute `call` without creating a transaction; returns the return
    /// data.
    pub async fn call(
        &self,
        call: &CallRequest,
        block: Option<BlockNumberOrTag>,
    ) -> Result<Bytes, EthError> {
        let raw = self
            .client
            .request(
                methods::CALL,
                vec![json!(call), json!(block.unwrap_or_default())],
            )
            .await?;
        Ok(decode::json(&raw)?)
    }

    /// Estimated gas for `call`.
    pub async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, EthError> {
        let raw = self
            .client
            .request(methods::ESTIMATE_GAS, vec![json!(call)])
            .await?;
        Ok(decode::u64(&raw)?)
    }

    /// Access list the node would generate for `call`. An `error` field
    /// embedded in the result becomes [`DecodeError::Rpc`].
    pub async fn create_access_list(
        &self,
        call: &CallRequest,
        block: Option<BlockNumberOrTag>,
    ) -> Result<AccessList, EthError> {
        let raw = self
            .client
            .request(
                methods::CREATE_ACCESS_LIST,
                vec![json!(call), json!(block.unwrap_or_default())],
            )
            .await?;
        let result: AccessListResult = decode::json(&raw)?;
        match result.error {
            Some(message) if !message.is_empty() => Err(DecodeError::Rpc(message).into()),
            _ => Ok(result.access_list),
        }
    }

    // Blocks

    /// Latest block number.
    pub async fn block_number(&self) -> Result<u64, EthError> {
        let raw = self.client.request(methods::BLOCK_NUMBER, vec![]).await?;
        Ok(decode::u64(&raw)?)
    }

    /// Block by number or tag; `None` if the node does not know it.
    /// `full_tx` selects whole transaction objects over hashes.
    pub async fn get_block_by_number(
        &self,
        block: impl Into<BlockNumberOrTag>,
        full_tx: bool,
    ) -> Result<Option<Block>, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_BLOCK_BY_NUMBER,
                vec![json!(block.into()), json!(full_tx)],
            )
            .await?;
        Ok(decode::optional(&raw)?)
    }

    /// Block by hash; `None` if the node does not know it.
    pub async fn get_block_by_hash(
        &self,
        hash: B256,
        full_tx: bool,
    ) -> Result<Option<Block>, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_BLOCK_BY_HASH,
                vec![json!(hash), json!(full_tx)],
            )
            .await?;
        Ok(decode::optional(&raw)?)
    }

    /// Number of transactions in the block at `block`.
    pub async fn get_block_transaction_count_by_number(
        &self,
        block: impl Into<BlockNumberOrTag>,
    ) -> Result<u64, EthError> {
        let raw = self
            .client
            .request(
                methods::GET_BLOCK_TRANSACTION_COUNT_BY_NUMBER,
                vec![json!(block.into())],
            )
            .await?;
        Ok(decode::u64(&raw)?)
    }

    /// Number of transactions in the block with `hash`.
    pub async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<u64, EthError> {
        let raw = self
            .client
            .request(methods::GET_BLOCK_TRANSACTION_COUNT_BY_HASH, vec![json!(hash)])
            .await?;
        Ok(decode::u64(&raw)?)
    }

    /// Base-fee and priority-fee history for `block_count` blocks ending at
    /// `newest`.
    pub async fn fee_history(
        &self,
        block_count: u64,
        newest: impl Into<BlockNumberOrTag>,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, EthError> {
        let raw = self
            .client
            .request(
                methods::FEE_HISTORY,
                vec![
                    json!(U64::from(block_count)),
                    json!(newest.into()),
                    json!(reward_percentiles),
                ],
            )
            .await?;
        Ok(decode::json(&raw)?)
    }

    // Transactions

    /// Transaction by hash; `None` if the node has never seen it.
    pub async fn get_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<Transaction>, EthError> {
        let raw = self
            .client
            .request(methods::GET_TRANSACTION_BY_HASH, vec![json!(hash)])
            .await?;
        Ok(decode::optional(&raw)?)
    }

    /// Receipt for a mined transaction; `None` while it is pending or
    /// unknown.
    pub async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, EthError> {
        let raw = self
            .client
            .request(methods::GET_TRANSACTION_RECEIPT, vec![json!(hash)])
            .await?;
        Ok(decode::optional(&raw)?)
    }

    /// Submit a signed, serialized transaction; returns its hash.
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256, EthError> {
        let raw = self
            .client
            .request(
                methods::SEND_RAW_TRANSACTION,
                vec![json!(format!("0x{}", hex::encode(raw_tx)))],
            )
            .await?;
        Ok(decode::b256(&raw)?)
    }

    // Chain state

    pub async fn chain_id(&self) -> Result<u64, EthError> {
        let raw = self.client.request(methods::CHAIN_ID, vec![]).await?;
        Ok(decode::u64(&raw)?)
    }

    /// Legacy gas price in wei.
    pub async fn gas_price(&self) -> Result<U256, EthError> {
        let raw = self.client.request(methods::GAS_PRICE, vec![]).await?;
        Ok(decode::u256(&raw)?)
    }

    /// Node sync state.
    pub async fn syncing(&self) -> Result<SyncStatus, EthError> {
        let raw = self.client.request(methods::SYNCING, vec![]).await?;
        Ok(decode::json(&raw)?)
    }

    /// Network id, as a decimal string.
    pub async fn net_version(&self) -> Result<String, EthError> {
        let raw = self.client.request(methods::NET_VERSION, vec![]).await?;
        Ok(decode::string(&raw)?)
    }

    /// Node software identifier.
    pub async fn client_version(&self) -> Result<String, EthError> {
        let raw = self
            .client
            .request(methods::WEB3_CLIENT_VERSION, vec![])
            .await?;
        Ok(decode::string(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use alloy_primitives::{address, b256};
    use async_trait::async_trait;
    use chainclient_core::{Transport, TransportError};

    use crate::block_tag::BlockTag;

    type CallLog = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

    /// Replays canned raw results in order and records every call.
    struct Scripted {
        calls: CallLog,
        replies: Mutex<VecDeque<&'static str>>,
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn request(
            &self,
            method: &str,
            params: Vec<Value>,
        ) -> Result<Box<RawValue>, TransportError> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::Http("script exhausted".into()))?;
            Ok(RawValue::from_string(reply.to_string()).unwrap())
        }

        fn endpoint(&self) -> &str {
            "mock"
        }
    }

    fn eth(replies: Vec<&'static str>) -> (EthClient, CallLog) {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let transport: Arc<dyn Transport> = Arc::new(Scripted {
            calls: Arc::clone(&calls),
            replies: Mutex::new(replies.into()),
        });
        let client = Client::new(vec![transport]).unwrap();
        (EthClient::new(client), calls)
    }

    #[tokio::test]
    async fn get_balance_sends_address_and_default_tag() {
        let (eth, calls) = eth(vec!["\"0xde0b6b3a7640000\""]);
        let holder = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");

        let balance = eth.get_balance(holder, None).await.unwrap();

        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u64));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "eth_getBalance");
        assert_eq!(
            calls[0].1,
            vec![
                json!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"),
                json!("latest"),
            ]
        );
    }

    #[tokio::test]
    async fn explicit_block_tag_is_passed_through() {
        let (eth, calls) = eth(vec!["\"0x5\""]);
        let holder = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");

        let nonce = eth
            .get_transaction_count(holder, Some(BlockTag::Pending.into()))
            .await
            .unwrap();

        assert_eq!(nonce, 5);
        assert_eq!(calls.lock().unwrap()[0].1[1], json!("pending"));
    }

    #[tokio::test]
    async fn numeric_blocks_are_hex_quantities() {
        let (eth, calls) = eth(vec!["null"]);

        let block = eth.get_block_by_number(42u64, false).await.unwrap();

        assert!(block.is_none());
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "eth_getBlockByNumber");
        assert_eq!(calls[0].1, vec![json!("0x2a"), json!(false)]);
    }

    #[tokio::test]
    async fn receipt_round_trip() {
        let receipt_json = r#"{
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "transactionIndex": "0x0",
            "blockHash": "0x8faf92a1b4252fb4b5b1b5a52d9e1a87b07c25ad4d58da2bbf0a3f1f0cb37a3c",
            "blockNumber": "0x1b4",
            "from": "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d",
            "to": "0xf02c1c8e6114b1dbe8937a39260b5b0a374432bb",
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "logs": [],
            "logsBloom": "0x00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
            "status": "0x1"
        }"#;
        let (eth, _) = eth(vec![receipt_json]);
        let hash = b256!("88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b");

        let receipt = eth.get_transaction_receipt(hash).await.unwrap().unwrap();

        assert_eq!(receipt.transaction_hash, hash);
        assert!(receipt.is_success());
    }

    #[tokio::test]
    async fn create_access_list_decodes_entries() {
        let (eth, _) = eth(vec![
            r#"{
                "accessList": [{
                    "address": "0xf02c1c8e6114b1dbe8937a39260b5b0a374432bb",
                    "storageKeys": [
                        "0x0000000000000000000000000000000000000000000000000000000000000003"
                    ]
                }],
                "gasUsed": "0x5208"
            }"#,
        ]);

        let list = eth
            .create_access_list(&CallRequest::new(), None)
            .await
            .unwrap();

        assert_eq!(list.0.len(), 1);
        assert_eq!(
            list.0[0].address,
            address!("f02c1c8e6114b1dbe8937a39260b5b0a374432bb")
        );
    }

    #[tokio::test]
    async fn create_access_list_surfaces_embedded_error() {
        let (eth, _) = eth(vec![r#"{"accessList": [], "error": "execution reverted"}"#]);

        let err = eth
            .create_access_list(&CallRequest::new(), None)
            .await
            .unwrap_err();

        assert!(
            matches!(&err, EthError::Decode(DecodeError::Rpc(msg)) if msg == "execution reverted"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn send_raw_transaction_hex_encodes_payload() {
        let (eth, calls) = eth(vec![
            "\"0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b\"",
        ]);

        let hash = eth.send_raw_transaction(&[0x02, 0xf8, 0x01]).await.unwrap();

        assert_eq!(
            hash,
            b256!("88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b")
        );
        assert_eq!(calls.lock().unwrap()[0].1, vec![json!("0x02f801")]);
    }

    #[tokio::test]
    async fn chain_state_methods_decode() {
        let (eth, _) = eth(vec!["\"0x1\"", "\"0x4a817c800\"", "false", "\"1\""]);

        assert_eq!(eth.chain_id().await.unwrap(), 1);
        assert_eq!(eth.gas_price().await.unwrap(), U256::from(20_000_000_000u64));
        assert!(!eth.syncing().await.unwrap().is_syncing());
        assert_eq!(eth.net_version().await.unwrap(), "1");
    }

    #[tokio::test]
    async fn raw_request_passes_through() {
        let (eth, calls) = eth(vec!["\"0xdeadbeef\""]);

        let raw = eth
            .request("web3_sha3", vec![json!("0x68656c6c6f")])
            .await
            .unwrap();

        assert_eq!(raw.get(), "\"0xdeadbeef\"");
        assert_eq!(calls.lock().unwrap()[0].0, "web3_sha3");
    }
}
