//! Local-key signing on top of [`EthClient`].
//!
//! Holds a secp256k1 key in memory and signs EIP-1559 transactions,
//! EIP-191 personal messages, and EIP-712 typed data. Chain state (nonce,
//! chain id) comes from the wrapped client; nothing else is fetched.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_dyn_abi::TypedData;
use alloy_eips::eip2718::Encodable2718;
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use thiserror::Error;

use crate::block_tag::BlockTag;
use crate::client::{EthClient, EthError};

/// Errors from wallet construction and signing flows.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Eth(#[from] EthError),

    #[error("signing failed: {0}")]
    Signer(String),

    #[error("invalid typed data: {0}")]
    TypedData(String),
}

/// An [`EthClient`] paired with a local signing key.
#[derive(Clone)]
pub struct WalletClient {
    eth: EthClient,
    signer: PrivateKeySigner,
}

impl WalletClient {
    /// Build a wallet from a hex-encoded private key (with or without the
    /// `0x` prefix). The sender address is derived from the key.
    pub fn new(eth: EthClient, private_key_hex: &str) -> Result<Self, WalletError> {
        let signer: PrivateKeySigner = private_key_hex
            .parse()
            .map_err(|err| WalletError::InvalidKey(format!("{err}")))?;
        Ok(Self::from_signer(eth, signer))
    }

    pub fn from_signer(eth: EthClient, signer: PrivateKeySigner) -> Self {
        Self { eth, signer }
    }

    /// The address transactions are sent from.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The wrapped read client.
    pub fn eth(&self) -> &EthClient {
        &self.eth
    }

    /// Send `value` wei to `to` as an EIP-1559 transaction with an empty
    /// access list. Returns the transaction hash.
    pub async fn send_eth(
        &self,
        to: Address,
        value: U256,
        gas_limit: u64,
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    ) -> Result<B256, WalletError> {
        self.send_eth_1559(
            to,
            value,
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            AccessList::default(),
        )
        .await
    }

    /// Send `value` wei to `to` as an EIP-1559 transaction carrying
    /// `access_list`. The pending nonce and chain id are fetched through
    /// the wrapped client, so this makes three RPC calls.
    pub async fn send_eth_1559(
        &self,
        to: Address,
        value: U256,
        gas_limit: u64,
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
        access_list: AccessList,
    ) -> Result<B256, WalletError> {
        let nonce = self
            .eth
            .get_transaction_count(self.signer.address(), Some(BlockTag::Pending.into()))
            .await?;
        let chain_id = self.eth.chain_id().await?;

        let tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value,
            access_list,
            input: Bytes::new(),
        };

        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|err| WalletError::Signer(err.to_string()))?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));

        Ok(self.eth.send_raw_transaction(&envelope.encoded_2718()).await?)
    }

    /// Sign `message` as an EIP-191 personal message
    /// (`"\x19Ethereum Signed Message:\n" + len + message`).
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        self.signer
            .sign_message_sync(message)
            .map_err(|err| WalletError::Signer(err.to_string()))
    }

    /// Sign an `eth_signTypedData_v4` JSON payload per EIP-712.
    pub fn sign_typed_data(&self, typed_data_json: &str) -> Result<Signature, WalletError> {
        let hash = typed_data_hash(typed_data_json)?;
        self.signer
            .sign_hash_sync(&hash)
            .map_err(|err| WalletError::Signer(err.to_string()))
    }
}

// Shows the sender address; the signing key stays out of debug output.
impl std::fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletClient")
            .field("address", &self.signer.address())
            .field("eth", &self.eth)
            .finish()
    }
}

/// EIP-712 signing hash of an `eth_signTypedData_v4` JSON payload:
/// `keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(message))`.
pub fn typed_data_hash(typed_data_json: &str) -> Result<B256, WalletError> {
    let typed: TypedData = serde_json::from_str(typed_data_json)
        .map_err(|err| WalletError::TypedData(err.to_string()))?;
    typed
        .eip712_signing_hash()
        .map_err(|err| WalletError::TypedData(err.to_string()))
}
