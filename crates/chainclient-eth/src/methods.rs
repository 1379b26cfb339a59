//! Ethereum JSON-RPC method names.

// Block API
pub const BLOCK_NUMBER: &str = "eth_blockNumber";
pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
pub const GET_BLOCK_TRANSACTION_COUNT_BY_NUMBER: &str = "eth_getBlockTransactionCountByNumber";
pub const GET_BLOCK_TRANSACTION_COUNT_BY_HASH: &str = "eth_getBlockTransactionCountByHash";
pub const FEE_HISTORY: &str = "eth_feeHistory";

// Transaction API
pub const GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";
pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";

// Account / contract API
pub const GET_BALANCE: &str = "eth_getBalance";
pub const GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
pub const GET_CODE: &str = "eth_getCode";
pub const GET_STORAGE_AT: &str = "eth_getStorageAt";
pub const CALL: &str = "eth_call";
pub const ESTIMATE_GAS: &str = "eth_estimateGas";
pub const CREATE_ACCESS_LIST: &str = "eth_createAccessList";

// Chain state API
pub const CHAIN_ID: &str = "eth_chainId";
pub const GAS_PRICE: &str = "eth_gasPrice";
pub const SYNCING: &str = "eth_syncing";

// net namespace
pub const NET_VERSION: &str = "net_version";

// web3 namespace
pub const WEB3_CLIENT_VERSION: &str = "web3_clientVersion";
