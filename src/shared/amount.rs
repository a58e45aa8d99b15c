//! Pure conversion between human-readable decimal strings and raw token
//! amounts.
//!
//! All math is exact 256-bit integer arithmetic. No floats, no async, no
//! network calls.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::shared::serde_util;

/// A token quantity in the asset's smallest unit.
///
/// Serializes as a decimal string so values beyond the JSON-safe integer
/// range survive unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AmountValue(#[serde(with = "serde_util::u256_dec")] U256);

impl AmountValue {
    pub const ZERO: AmountValue = AmountValue(U256::ZERO);

    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a base-10 integer string of raw units.
    pub fn from_dec_str(s: &str) -> Result<Self, AmountError> {
        let digits = s.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::InvalidDecimal {
                input: s.to_string(),
                reason: "expected an unsigned integer".to_string(),
            });
        }
        U256::from_str_radix(digits, 10)
            .map(Self)
            .map_err(|_| AmountError::Overflow {
                context: format!("{} does not fit in 256 bits", digits),
            })
    }
}

impl From<U256> for AmountValue {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl From<u64> for AmountValue {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl fmt::Display for AmountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while converting amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    InvalidDecimal { input: String, reason: String },
    TooManyDecimals { input: String, decimals: u8 },
    Overflow { context: String },
    ZeroAmount,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "Amount is empty"),
            AmountError::InvalidDecimal { input, reason } => {
                write!(f, "Invalid decimal '{}': {}", input, reason)
            }
            AmountError::TooManyDecimals { input, decimals } => write!(
                f,
                "'{}' has more than {} fractional digits",
                input, decimals
            ),
            AmountError::Overflow { context } => write!(f, "Overflow: {}", context),
            AmountError::ZeroAmount => write!(f, "Amount must be greater than zero"),
        }
    }
}

impl std::error::Error for AmountError {}

/// `10^decimals` as a U256.
pub fn pow10(decimals: u8) -> Result<U256, AmountError> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| AmountError::Overflow {
            context: format!("10^{} overflow", decimals),
        })
}

/// Convert a human-readable decimal string into raw units.
///
/// # Conversion
///
/// ```text
/// raw = integer_part * 10^decimals + fraction_part (right-padded to `decimals` digits)
/// ```
///
/// Fractional digits beyond `decimals` are accepted only when they are zeros.
pub fn parse_amount(input: &str, decimals: u8) -> Result<AmountValue, AmountError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }

    let invalid = |reason: &str| AmountError::InvalidDecimal {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    if frac_part.contains('.') {
        return Err(invalid("more than one decimal point"));
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("only digits and a single '.' are allowed"));
    }

    let width = decimals as usize;
    let frac = if frac_part.len() > width {
        let (kept, excess) = frac_part.split_at(width);
        if excess.bytes().any(|b| b != b'0') {
            return Err(AmountError::TooManyDecimals {
                input: input.to_string(),
                decimals,
            });
        }
        kept.to_string()
    } else {
        format!("{:0<width$}", frac_part, width = width)
    };

    let digits = format!("{}{}", int_part, frac);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(AmountValue::ZERO);
    }

    U256::from_str_radix(digits, 10)
        .map(AmountValue)
        .map_err(|_| AmountError::Overflow {
            context: format!("{} with {} decimals does not fit in 256 bits", text, decimals),
        })
}

/// Convert raw units into a canonical decimal string.
///
/// Trailing fractional zeros are stripped but one fractional digit is always
/// kept (`"1.0"`), matching how wallets display balances. With zero decimals
/// the plain integer is returned.
pub fn format_amount(value: AmountValue, decimals: u8) -> String {
    let digits = value.0.to_string();
    if decimals == 0 {
        return digits;
    }

    let width = decimals as usize;
    let padded = if digits.len() <= width {
        format!("{:0>width$}", digits, width = width + 1)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - width);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}.0", int_part)
    } else {
        format!("{}.{}", int_part, frac)
    }
}

/// Rescale a raw amount from one decimal precision to another.
///
/// Scaling down truncates (rounds toward zero), which is the conservative
/// direction for an estimated output.
pub fn rescale(value: AmountValue, from_decimals: u8, to_decimals: u8) -> Result<AmountValue, AmountError> {
    use std::cmp::Ordering;

    match from_decimals.cmp(&to_decimals) {
        Ordering::Equal => Ok(value),
        Ordering::Greater => {
            let divisor = pow10(from_decimals - to_decimals)?;
            Ok(AmountValue(value.0 / divisor))
        }
        Ordering::Less => {
            let multiplier = pow10(to_decimals - from_decimals)?;
            value
                .0
                .checked_mul(multiplier)
                .map(AmountValue)
                .ok_or_else(|| AmountError::Overflow {
                    context: format!("{} * 10^{}", value, to_decimals - from_decimals),
                })
        }
    }
}
