//! # Unit Conversion Errors

use thiserror::Error;

/// Errors from decimal parsing and slippage math.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    /// Input was empty or not a plain decimal number.
    #[error("invalid decimal amount: {0:?}")]
    InvalidAmount(String),

    /// More fractional digits than the unit supports.
    #[error("too many decimal places: {given} given, {max} allowed")]
    TooManyDecimals {
        /// Fractional digits in the input.
        given: usize,
        /// Decimals of the target unit.
        max: u8,
    },

    /// Value does not fit in 256 bits.
    #[error("amount overflows 256 bits")]
    Overflow,

    /// Slippage above 100%.
    #[error("slippage out of range: {0} bps")]
    SlippageOutOfRange(u32),
}

/// Result type for unit conversions.
pub type UnitsResult<T> = Result<T, UnitsError>;
