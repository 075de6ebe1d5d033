//! Human-readable token amount parsing.
//!
//! This module provides [`DecimalAmount`], a type for parsing user-entered
//! amounts like `"100.0"` or `"1,000.50"` into exact decimal values, and for
//! scaling them into a token's base units once its decimal precision is known.
//!
//! # Supported Formats
//!
//! - Plain numbers: `"100"`, `"0.01"`
//! - With a leading currency symbol: `"$10.50"`
//! - With thousand separators: `"1,000"`, `"1,000,000.50"`
//!
//! Surrounding whitespace is ignored. Anything else (exponents, inner
//! whitespace, letters, misplaced separators) is [`DecimalAmountError::InvalidFormat`].
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::U256;
//! use permit_relay_types::util::DecimalAmount;
//!
//! let amount = DecimalAmount::parse("100.0").unwrap();
//! assert_eq!(amount.to_base_units(6).unwrap(), U256::from(100_000_000u64));
//! ```

use alloy_primitives::U256;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

static AMOUNT_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sign>-)?\$?(?P<whole>\d{1,3}(?:,\d{3})+|\d+)(?P<fraction>\.\d+)?$")
        .expect("valid regex")
});

/// A parsed, strictly positive decimal amount.
///
/// The original precision is preserved: [`scale`](DecimalAmount::scale) is the
/// number of fractional digits and [`mantissa`](DecimalAmount::mantissa) the
/// value as an integer. `"10.50"` has scale 2 and mantissa 1050.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalAmount(Decimal);

/// Errors that can occur when parsing or scaling a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalAmountError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
    /// Zero is not a transferable amount.
    #[error("Amount must be greater than zero")]
    Zero,
    /// The input has more decimal places than the token supports.
    #[error("Too big of a precision: {money} vs {token} on token")]
    WrongPrecision {
        /// Decimal places in the input.
        money: u32,
        /// Decimal places supported by the token.
        token: u32,
    },
    /// The scaled amount does not fit into 256 bits.
    #[error("Amount is out of range for the token")]
    OutOfRange,
}

impl DecimalAmount {
    /// Parses a human-readable amount string.
    ///
    /// A leading `$` and `,` thousand separators are accepted. The result
    /// must be strictly positive.
    pub fn parse(input: &str) -> Result<Self, DecimalAmountError> {
        let captures = AMOUNT_FORMAT
            .captures(input.trim())
            .ok_or(DecimalAmountError::InvalidFormat)?;
        let sign = captures.name("sign").map_or("", |m| m.as_str());
        let whole = captures["whole"].replace(',', "");
        let fraction = captures.name("fraction").map_or("", |m| m.as_str());
        let parsed = Decimal::from_str(&format!("{sign}{whole}{fraction}"))
            .map_err(|_| DecimalAmountError::InvalidFormat)?;
        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(DecimalAmountError::Negative);
        }
        if parsed.is_zero() {
            return Err(DecimalAmountError::Zero);
        }
        Ok(DecimalAmount(parsed))
    }

    /// Returns the number of decimal places in the original input.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Returns the value as an unsigned integer (without decimal point).
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    /// Scales the amount into base units of a token with `decimals` precision.
    ///
    /// Fails if the input carries more fractional digits than the token
    /// supports; amounts are never silently rounded.
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, DecimalAmountError> {
        let scale = self.scale();
        let token_scale = decimals as u32;
        if scale > token_scale {
            return Err(DecimalAmountError::WrongPrecision {
                money: scale,
                token: token_scale,
            });
        }
        let multiplier = U256::from(10u8)
            .checked_pow(U256::from(token_scale - scale))
            .ok_or(DecimalAmountError::OutOfRange)?;
        U256::from(self.mantissa())
            .checked_mul(multiplier)
            .ok_or(DecimalAmountError::OutOfRange)
    }
}

impl FromStr for DecimalAmount {
    type Err = DecimalAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecimalAmount::parse(s)
    }
}

impl TryFrom<&str> for DecimalAmount {
    type Error = DecimalAmountError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DecimalAmount::parse(value)
    }
}

impl Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Formats a base-unit amount as a decimal string with `decimals` precision.
///
/// Trailing fractional zeros are trimmed: `1500000` with 6 decimals is `"1.5"`.
pub fn format_base_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}
