//! Pair selection and fee / output estimates.
//!
//! # Fee math
//!
//! ```text
//! fee        = amount_in * fee_bps / 10_000            (from-token units)
//! amount_out = rescale(amount_in) - rescale(fee)       (to-token units)
//! ```
//!
//! Rescaling multiplies or divides by an exact power of ten; division
//! truncates toward zero.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::error::SdkError;
use crate::registry::{AssetMetadata, WrapperDescriptor};
use crate::shared::amount::rescale;
use crate::shared::{format_amount, parse_amount, AmountError, AmountValue, AssetAddress, Direction};

/// Basis points per whole.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// The selected (from, to) tokens of one wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePair {
    pub wrapper: WrapperDescriptor,
    pub from: AssetMetadata,
    pub to: AssetMetadata,
    pub direction: Direction,
}

impl ExchangePair {
    pub fn new(wrapper: WrapperDescriptor, direction: Direction) -> Self {
        let (from, to) = match direction {
            Direction::Wrap => (wrapper.d_token(), wrapper.c_asset()),
            Direction::Unwrap => (wrapper.c_asset(), wrapper.d_token()),
        };
        Self {
            wrapper,
            from,
            to,
            direction,
        }
    }

    /// The first wrapper listing `symbol` on either side; `symbol` becomes
    /// the from token.
    pub fn for_symbol(descriptors: &[WrapperDescriptor], symbol: &str) -> Option<Self> {
        descriptors.iter().find_map(|d| {
            if d.d_token_symbol == symbol {
                Some(Self::new(d.clone(), Direction::Wrap))
            } else if d.c_asset_symbol == symbol {
                Some(Self::new(d.clone(), Direction::Unwrap))
            } else {
                None
            }
        })
    }

    /// The wrapper connecting `from` and `to`, in either order.
    pub fn for_tokens(
        descriptors: &[WrapperDescriptor],
        from: &AssetAddress,
        to: &AssetAddress,
    ) -> Option<Self> {
        descriptors.iter().find_map(|d| {
            if d.d_token_address == *from && d.c_asset_address == *to {
                Some(Self::new(d.clone(), Direction::Wrap))
            } else if d.c_asset_address == *from && d.d_token_address == *to {
                Some(Self::new(d.clone(), Direction::Unwrap))
            } else {
                None
            }
        })
    }

    /// Swap from/to and reverse the direction.
    pub fn flip(&self) -> Self {
        Self::new(self.wrapper.clone(), self.direction.reversed())
    }

    pub fn fee_bps(&self) -> U256 {
        self.wrapper.fees.for_direction(self.direction)
    }

    /// Estimate fee and output for a human-readable amount of `from`.
    ///
    /// An empty or zero amount yields an empty quote.
    pub fn quote(&self, amount: &str) -> Result<Quote, SdkError> {
        if amount.trim().is_empty() {
            return Ok(Quote::empty(self));
        }
        let amount_in = parse_amount(amount, self.from.decimals)?;
        if amount_in.is_zero() {
            return Ok(Quote::empty(self));
        }

        let fee_bps = self.fee_bps();
        let fee = amount_in
            .raw()
            .checked_mul(fee_bps)
            .map(|v| v / U256::from(BPS_DENOMINATOR))
            .ok_or_else(|| AmountError::Overflow {
                context: format!("{} * {} bps", amount_in, fee_bps),
            })?;

        let scaled_in = rescale(amount_in, self.from.decimals, self.to.decimals)?;
        let scaled_fee = rescale(AmountValue::new(fee), self.from.decimals, self.to.decimals)?;
        let amount_out = scaled_in.raw().saturating_sub(scaled_fee.raw());

        Ok(Quote {
            amount_in,
            fee: scaled_fee,
            amount_out: AmountValue::new(amount_out),
            fee_bps,
            from_decimals: self.from.decimals,
            to_decimals: self.to.decimals,
        })
    }
}

/// Fee / output estimate for one amount.
///
/// `amount_in` is in from-token units; `fee` and `amount_out` are in
/// to-token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub amount_in: AmountValue,
    pub fee: AmountValue,
    pub amount_out: AmountValue,
    #[serde(with = "crate::shared::serde_util::u256_dec")]
    pub fee_bps: U256,
    pub from_decimals: u8,
    pub to_decimals: u8,
}

impl Quote {
    fn empty(pair: &ExchangePair) -> Self {
        Self {
            amount_in: AmountValue::ZERO,
            fee: AmountValue::ZERO,
            amount_out: AmountValue::ZERO,
            fee_bps: pair.fee_bps(),
            from_decimals: pair.from.decimals,
            to_decimals: pair.to.decimals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount_in.is_zero()
    }

    /// Fee as a percentage (`30` bps → `0.30`). `None` if the rate does not
    /// fit a `Decimal`.
    pub fn fee_rate(&self) -> Option<Decimal> {
        let bps = Decimal::from_str(&self.fee_bps.to_string()).ok()?;
        bps.checked_div(Decimal::from(100u32))
    }

    pub fn fee_text(&self) -> String {
        format_amount(self.fee, self.to_decimals)
    }

    pub fn amount_out_text(&self) -> String {
        format_amount(self.amount_out, self.to_decimals)
    }
}
