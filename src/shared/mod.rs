//! Shared newtypes and utilities used across all modules.
//!
//! These types are serialization-transparent: they serialize/deserialize as the
//! plain strings a wallet or JSON-RPC node sends, so they can be used directly
//! in wire types without conversion overhead.

pub mod amount;
pub mod serde_util;

pub use amount::{format_amount, parse_amount, AmountError, AmountValue};

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::SdkError;

// ─── AssetAddress ────────────────────────────────────────────────────────────

/// Address of an on-chain asset or contract, kept as an opaque string.
///
/// Never dereferenced; parsed to a 20-byte [`Address`] only when a call is
/// ABI-encoded. Comparison is case-insensitive so checksummed and lowercase
/// forms of the same address are equal.
#[derive(Debug, Clone, Eq)]
pub struct AssetAddress(String);

impl AssetAddress {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_address(&self) -> Result<Address, SdkError> {
        Address::from_str(self.0.trim())
            .map_err(|e| SdkError::InvalidAddress(format!("{}: {}", self.0, e)))
    }

    pub fn from_address(address: Address) -> Self {
        Self(address.to_checksum(None))
    }

    /// Abbreviated form for display: `0x1234...abcd`.
    pub fn short(&self) -> String {
        let s = &self.0;
        match (s.get(..6), s.len().checked_sub(4).and_then(|i| s.get(i..))) {
            (Some(head), Some(tail)) if s.len() >= 10 => format!("{}...{}", head, tail),
            _ => s.clone(),
        }
    }
}

impl PartialEq for AssetAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for AssetAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for AssetAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AssetAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Address> for AssetAddress {
    fn from(address: Address) -> Self {
        Self::from_address(address)
    }
}

impl Serialize for AssetAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AssetAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AssetAddress(s))
    }
}

// ─── TransactionHash ─────────────────────────────────────────────────────────

/// Identifying hash of a submitted transaction (`0x`-prefixed hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHash(String);

impl TransactionHash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TransactionHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TransactionHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Serialize for TransactionHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(TransactionHash(s))
    }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Exchange direction between an underlying asset (dToken) and its
/// derivative (cAsset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Spend the underlying asset, receive the derivative.
    Wrap,
    /// Spend the derivative asset, receive the underlying.
    Unwrap,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Wrap => "wrap",
            Direction::Unwrap => "unwrap",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Wrap => Direction::Unwrap,
            Direction::Unwrap => Direction::Wrap,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
