//! Wrapper registry types and the scanner that builds them.

pub mod scanner;

pub use scanner::{ScanReport, ScanWarning, SkippedWrapper, WrapperRegistryScanner};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::shared::serde_util;
use crate::shared::{AssetAddress, Direction};

/// One side of a wrapper: a fungible asset and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub address: AssetAddress,
    pub symbol: String,
    pub decimals: u8,
}

/// Exchange fees in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
    /// Charged when wrapping (dToken in).
    #[serde(with = "serde_util::u256_dec")]
    pub in_bps: U256,
    /// Charged when unwrapping (dToken out).
    #[serde(with = "serde_util::u256_dec")]
    pub out_bps: U256,
}

impl Fees {
    pub fn for_direction(&self, direction: Direction) -> U256 {
        match direction {
            Direction::Wrap => self.in_bps,
            Direction::Unwrap => self.out_bps,
        }
    }
}

/// Aggregated metadata for one wrapper instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperDescriptor {
    pub wrapper: AssetAddress,
    pub d_token_address: AssetAddress,
    pub d_token_symbol: String,
    pub d_token_decimals: u8,
    pub c_asset_address: AssetAddress,
    pub c_asset_symbol: String,
    pub c_asset_decimals: u8,
    pub fees: Fees,
    pub d_token_treasury: AssetAddress,
    pub c_asset_treasury: AssetAddress,
}

impl WrapperDescriptor {
    /// The underlying asset.
    pub fn d_token(&self) -> AssetMetadata {
        AssetMetadata {
            address: self.d_token_address.clone(),
            symbol: self.d_token_symbol.clone(),
            decimals: self.d_token_decimals,
        }
    }

    /// The derivative asset.
    pub fn c_asset(&self) -> AssetMetadata {
        AssetMetadata {
            address: self.c_asset_address.clone(),
            symbol: self.c_asset_symbol.clone(),
            decimals: self.c_asset_decimals,
        }
    }
}
