//! Decoding raw JSON-RPC results into typed values.
//!
//! Every function here is pure: it takes the raw `result` payload handed
//! back by the dispatch engine and either produces a typed value or a
//! [`DecodeError`] that says what was wrong with the payload. Nothing here
//! talks to the network.

use alloy_primitives::{Address, B256, U256};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use thiserror::Error;

/// ABI selector of `Error(string)`, the standard revert payload.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Errors raised while decoding a raw response payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload decoded to an empty string.
    #[error("empty response data")]
    EmptyResponse,

    /// The payload was JSON `null` where a value was required.
    #[error("received null response")]
    NullResponse,

    /// The payload was not valid hex for the expected type.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// A hex quantity did not fit the target integer type.
    #[error("quantity overflows target type: {0}")]
    Overflow(String),

    /// The payload was not the expected JSON shape.
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// An RPC-reported error embedded inside an otherwise-successful result
    /// (e.g. the `error` field of `eth_createAccessList`).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The payload was not an `Error(string)` revert blob.
    #[error("not an Error(string) revert payload")]
    NotRevertData,
}

/// Decode a hex quantity (`"0x…"`) into a [`U256`].
pub fn u256(raw: &RawValue) -> Result<U256, DecodeError> {
    let hex: String = serde_json::from_str(raw.get())?;
    let digits = hex.strip_prefix("0x").unwrap_or(&hex);
    if digits.is_empty() {
        return Err(DecodeError::InvalidHex(hex));
    }
    U256::from_str_radix(digits, 16).map_err(|_| DecodeError::InvalidHex(hex))
}

/// Decode a hex quantity into a `u64`, erroring on overflow.
pub fn u64(raw: &RawValue) -> Result<u64, DecodeError> {
    let value = u256(raw)?;
    u64::try_from(value).map_err(|_| DecodeError::Overflow(value.to_string()))
}

/// Decode a JSON string, rejecting `null`, empty strings and a bare `"0x"`.
pub fn string(raw: &RawValue) -> Result<String, DecodeError> {
    if raw.get() == "null" {
        return Err(DecodeError::NullResponse);
    }
    let s: String = serde_json::from_str(raw.get())?;
    if s.is_empty() {
        return Err(DecodeError::EmptyResponse);
    }
    if s.starts_with("0x") && s.len() < 3 {
        return Err(DecodeError::InvalidHex(s));
    }
    Ok(s)
}

/// Decode a JSON boolean.
pub fn bool(raw: &RawValue) -> Result<bool, DecodeError> {
    Ok(serde_json::from_str(raw.get())?)
}

/// Decode a 20-byte hex address.
pub fn address(raw: &RawValue) -> Result<Address, DecodeError> {
    let hex: String = serde_json::from_str(raw.get())?;
    hex.parse().map_err(|_| DecodeError::InvalidHex(hex))
}

/// Decode a 32-byte hex word.
pub fn b256(raw: &RawValue) -> Result<B256, DecodeError> {
    let hex: String = serde_json::from_str(raw.get())?;
    hex.parse().map_err(|_| DecodeError::InvalidHex(hex))
}

/// Decode the payload into any deserializable type.
pub fn json<T: DeserializeOwned>(raw: &RawValue) -> Result<T, DecodeError> {
    Ok(serde_json::from_str(raw.get())?)
}

/// Decode the payload into `Some(T)`, mapping JSON `null` to `None`.
///
/// The by-hash lookup methods answer `null` for unknown hashes; that is a
/// successful "not found", not an error.
pub fn optional<T: DeserializeOwned>(raw: &RawValue) -> Result<Option<T>, DecodeError> {
    if raw.get() == "null" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(raw.get())?))
}

/// Extract the reason string from an `Error(string)` revert payload, the
/// hex blob a reverted `eth_call` produces.
///
/// Layout: 4-byte selector, 32-byte data offset, 32-byte string length,
/// then the string bytes.
pub fn revert_reason(hex_data: &str) -> Result<String, DecodeError> {
    let bytes = hex::decode(hex_data.trim_start_matches("0x"))
        .map_err(|_| DecodeError::InvalidHex(hex_data.to_string()))?;

    if bytes.len() < 4 || bytes[..4] != ERROR_STRING_SELECTOR {
        return Err(DecodeError::NotRevertData);
    }
    if bytes.len() < 4 + 64 {
        return Err(DecodeError::NotRevertData);
    }

    let length = U256::from_be_slice(&bytes[4 + 32..4 + 64]);
    let length = usize::try_from(length).map_err(|_| DecodeError::NotRevertData)?;
    let start = 4 + 64;
    if bytes.len() < start + length {
        return Err(DecodeError::NotRevertData);
    }

    Ok(String::from_utf8_lossy(&bytes[start..start + length]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn u256_decodes_wei_quantities() {
        // 1 ETH in wei
        let one_eth = u256(&raw("\"0xde0b6b3a7640000\"")).unwrap();
        assert_eq!(one_eth, U256::from(1_000_000_000_000_000_000u64));

        assert_eq!(u256(&raw("\"0x0\"")).unwrap(), U256::ZERO);
    }

    #[test]
    fn u256_rejects_bad_hex() {
        assert!(matches!(
            u256(&raw("\"0xnothex\"")),
            Err(DecodeError::InvalidHex(_))
        ));
        assert!(matches!(u256(&raw("\"0x\"")), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(u256(&raw("12")), Err(DecodeError::Json(_))));
    }

    #[test]
    fn u64_decodes_and_bounds() {
        assert_eq!(u64(&raw("\"0x10\"")).unwrap(), 16);
        assert_eq!(u64(&raw("\"0xffffffffffffffff\"")).unwrap(), u64::MAX);
        assert!(matches!(
            u64(&raw("\"0x10000000000000000\"")),
            Err(DecodeError::Overflow(_))
        ));
    }

    #[test]
    fn string_rejects_null_empty_and_bare_prefix() {
        assert_eq!(string(&raw("\"hello\"")).unwrap(), "hello");
        assert_eq!(string(&raw("\"0x1234\"")).unwrap(), "0x1234");

        assert!(matches!(string(&raw("null")), Err(DecodeError::NullResponse)));
        assert!(matches!(string(&raw("\"\"")), Err(DecodeError::EmptyResponse)));
        assert!(matches!(string(&raw("\"0x\"")), Err(DecodeError::InvalidHex(_))));
    }

    #[test]
    fn bool_decodes() {
        assert!(bool(&raw("true")).unwrap());
        assert!(!bool(&raw("false")).unwrap());
        assert!(matches!(bool(&raw("\"yes\"")), Err(DecodeError::Json(_))));
    }

    #[test]
    fn address_decodes_and_validates() {
        let decoded = address(&raw("\"0xd8da6bf26964af9d7eed9e03e53415d37aa96045\"")).unwrap();
        assert_eq!(decoded, address!("d8da6bf26964af9d7eed9e03e53415d37aa96045"));

        assert!(matches!(
            address(&raw("\"0x1234\"")),
            Err(DecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn b256_decodes_storage_words() {
        let word = b256(&raw(
            "\"0x0000000000000000000000000000000000000000000000000000000000000001\"",
        ))
        .unwrap();
        assert_eq!(word, B256::with_last_byte(1));

        assert!(matches!(b256(&raw("\"0x01\"")), Err(DecodeError::InvalidHex(_))));
    }

    #[test]
    fn optional_maps_null_to_none() {
        #[derive(serde::Deserialize)]
        struct Probe {
            value: u32,
        }

        assert!(optional::<Probe>(&raw("null")).unwrap().is_none());
        let got = optional::<Probe>(&raw("{\"value\": 3}")).unwrap().unwrap();
        assert_eq!(got.value, 3);
    }

    #[test]
    fn revert_reason_decodes_standard_payload() {
        // require(false, "Not enough Ether provided.")
        let data = concat!(
            "0x08c379a0",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "000000000000000000000000000000000000000000000000000000000000001a",
            "4e6f7420656e6f7567682045746865722070726f76696465642e000000000000",
        );
        assert_eq!(revert_reason(data).unwrap(), "Not enough Ether provided.");
    }

    #[test]
    fn revert_reason_rejects_other_payloads() {
        // Wrong selector
        assert!(matches!(
            revert_reason("0xdeadbeef"),
            Err(DecodeError::NotRevertData)
        ));
        // Selector alone, no body
        assert!(matches!(
            revert_reason("0x08c379a0"),
            Err(DecodeError::NotRevertData)
        ));
        // Length field runs past the payload
        let truncated = concat!(
            "0x08c379a0",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "00000000000000000000000000000000000000000000000000000000000000ff",
            "4e6f7420656e6f756768",
        );
        assert!(matches!(
            revert_reason(truncated),
            Err(DecodeError::NotRevertData)
        ));
        // Not hex at all
        assert!(matches!(
            revert_reason("0xzz"),
            Err(DecodeError::InvalidHex(_))
        ));
    }
}
