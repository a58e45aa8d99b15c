//! Typed Ethereum JSON-RPC methods over any [`RpcTransport`].

use alloy_primitives::Address;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::provider::RpcTransport;
use crate::shared::serde_util::hex_u64;
use crate::shared::TransactionHash;

/// JSON-RPC method names.
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// A mined transaction receipt (the fields the SDK uses).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TransactionHash,
    #[serde(default, deserialize_with = "hex_u64::deserialize")]
    pub block_number: Option<u64>,
    #[serde(default, deserialize_with = "hex_u64::deserialize")]
    pub status: Option<u64>,
}

impl TxReceipt {
    /// Pre-Byzantium receipts carry no status; treat them as successful.
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s == 1).unwrap_or(true)
    }
}

/// Ask the wallet for account access. May prompt the user.
pub async fn request_accounts(transport: &dyn RpcTransport) -> Result<Vec<Address>, ProviderError> {
    let value = transport
        .request(methods::REQUEST_ACCOUNTS, json!([]))
        .await?;
    let raw: Vec<String> = serde_json::from_value(value)
        .map_err(|e| ProviderError::Malformed(format!("accounts: {}", e)))?;
    raw.iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ProviderError::Malformed(format!("account {}: {}", s, e)))
        })
        .collect()
}

pub async fn chain_id(transport: &dyn RpcTransport) -> Result<u64, ProviderError> {
    let value = transport.request(methods::CHAIN_ID, json!([])).await?;
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("chain id: {}", value)))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ProviderError::Malformed(format!("chain id {}: {}", raw, e)))
}

/// Execute a read-only call against the latest block.
pub async fn call(
    transport: &dyn RpcTransport,
    to: Address,
    data: &[u8],
) -> Result<Vec<u8>, ProviderError> {
    let params = json!([
        { "to": to.to_checksum(None), "data": encode_hex(data) },
        "latest"
    ]);
    let value = transport.request(methods::CALL, params).await?;
    decode_hex_value(&value)
}

/// Submit a transaction signed by `from`; returns its hash without waiting.
pub async fn send_transaction(
    transport: &dyn RpcTransport,
    from: Address,
    to: Address,
    data: &[u8],
) -> Result<TransactionHash, ProviderError> {
    let params = json!([{
        "from": from.to_checksum(None),
        "to": to.to_checksum(None),
        "data": encode_hex(data),
    }]);
    let value = transport.request(methods::SEND_TRANSACTION, params).await?;
    value
        .as_str()
        .map(TransactionHash::from)
        .ok_or_else(|| ProviderError::Malformed(format!("transaction hash: {}", value)))
}

/// Fetch a receipt; `None` while the transaction is still pending.
pub async fn transaction_receipt(
    transport: &dyn RpcTransport,
    hash: &TransactionHash,
) -> Result<Option<TxReceipt>, ProviderError> {
    let value = transport
        .request(methods::GET_TRANSACTION_RECEIPT, json!([hash.as_str()]))
        .await?;
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ProviderError::Malformed(format!("receipt: {}", e)))
}

pub(crate) fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>, ProviderError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("expected hex string, got {}", value)))?;
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| ProviderError::Malformed(format!("hex {}: {}", raw, e)))
}
