//! # Exact Decimal Units
//!
//! **NO FLOATING POINT ON LEDGER QUANTITIES**
//!
//! Token amounts live on-chain as integers scaled by `10^decimals`. This
//! module converts between that representation and human decimal strings,
//! and does the slippage math for swaps, all in `U256`.

use std::fmt;

use alloy_primitives::U256;

use crate::constants::{BPS_DENOMINATOR, DEFAULT_SLIPPAGE_BPS};
use crate::error::{UnitsError, UnitsResult};

/// Formats a scaled integer as a decimal string.
///
/// Trailing fractional zeros are trimmed; zero formats as `"0"`.
///
/// ```rust,ignore
/// assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
/// ```
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_owned()
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Parses a decimal string into a scaled integer.
///
/// Accepts `"12"`, `"12.5"`, `".5"` and `"12."`. Rejects signs, exponents,
/// and more fractional digits than `decimals`.
pub fn parse_units(amount: &str, decimals: u8) -> UnitsResult<U256> {
    let amount = amount.trim();
    let invalid = || UnitsError::InvalidAmount(amount.to_owned());

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > usize::from(decimals) {
        return Err(UnitsError::TooManyDecimals {
            given: fraction.len(),
            max: decimals,
        });
    }

    let mut digits = String::with_capacity(whole.len() + usize::from(decimals));
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(usize::from(decimals) - fraction.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| UnitsError::Overflow)
}

/// Slippage tolerance in basis points (1 bps = 0.01%).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slippage(u32);

impl Slippage {
    /// Creates a tolerance from basis points.
    pub fn from_bps(bps: u32) -> UnitsResult<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(UnitsError::SlippageOutOfRange(bps));
        }
        Ok(Self(bps))
    }

    /// Parses a percentage such as `"0.5"` (at most two fractional digits).
    pub fn from_percent(percent: &str) -> UnitsResult<Self> {
        let bps = parse_units(percent, 2)?;
        Self::from_bps(bps.saturating_to::<u32>())
    }

    /// Basis points.
    #[must_use]
    pub const fn bps(self) -> u32 {
        self.0
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Self(DEFAULT_SLIPPAGE_BPS)
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", format_units(U256::from(self.0), 2))
    }
}

/// Minimum acceptable output: `estimated × (1 − slippage)`, rounded down.
pub fn min_output(estimated_out: U256, slippage: Slippage) -> UnitsResult<U256> {
    let keep = U256::from(BPS_DENOMINATOR - slippage.bps());
    estimated_out
        .checked_mul(keep)
        .map(|scaled| scaled / U256::from(BPS_DENOMINATOR))
        .ok_or(UnitsError::Overflow)
}

/// Output for `amount_in` at a fixed rate.
///
/// `rate` is expressed in output base units per one whole input unit, so
/// `rate = parse_units("0.0001", 18)` means 0.0001 native per token.
pub fn quote_output(amount_in: U256, input_decimals: u8, rate: U256) -> UnitsResult<U256> {
    let scale = U256::from(10u64)
        .checked_pow(U256::from(input_decimals))
        .ok_or(UnitsError::Overflow)?;
    amount_in
        .checked_mul(rate)
        .map(|scaled| scaled / scale)
        .ok_or(UnitsError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
        assert_eq!(format_units(U256::from(3_000_000u64), 6), "3");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_units(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(parse_units("12.", 2).unwrap(), U256::from(1200u64));
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(parse_units("0.000", 3).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(matches!(parse_units("", 18), Err(UnitsError::InvalidAmount(_))));
        assert!(matches!(parse_units(".", 18), Err(UnitsError::InvalidAmount(_))));
        assert!(matches!(parse_units("-1", 18), Err(UnitsError::InvalidAmount(_))));
        assert!(matches!(parse_units("1e5", 18), Err(UnitsError::InvalidAmount(_))));
        assert!(matches!(parse_units("1.2.3", 18), Err(UnitsError::InvalidAmount(_))));
        assert_eq!(
            parse_units("0.001", 2),
            Err(UnitsError::TooManyDecimals { given: 3, max: 2 })
        );
    }

    #[test]
    fn test_parse_format_large_value_is_exact() {
        let text = "123456789012345678901234567890.123456789012345678";
        let value = parse_units(text, 18).unwrap();
        assert_eq!(format_units(value, 18), text);
    }

    #[test]
    fn test_slippage_parsing() {
        assert_eq!(Slippage::from_percent("0.5").unwrap().bps(), 50);
        assert_eq!(Slippage::from_percent("1").unwrap().bps(), 100);
        assert_eq!(Slippage::from_percent("100").unwrap().bps(), 10_000);
        assert!(Slippage::from_percent("100.01").is_err());
        assert_eq!(Slippage::default().to_string(), "0.5%");
    }

    #[test]
    fn test_min_output_half_percent() {
        // 10 native at 0.5% slippage -> 9.95 native.
        let estimated = parse_units("10", 18).unwrap();
        let min = min_output(estimated, Slippage::from_percent("0.5").unwrap()).unwrap();
        assert_eq!(min, parse_units("9.95", 18).unwrap());
        assert_eq!(format_units(min, 18), "9.95");
    }

    #[test]
    fn test_min_output_bounds() {
        let estimated = U256::from(1_000u64);
        assert_eq!(min_output(estimated, Slippage::from_bps(0).unwrap()).unwrap(), estimated);
        assert_eq!(min_output(estimated, Slippage::from_bps(10_000).unwrap()).unwrap(), U256::ZERO);
        assert_eq!(min_output(U256::MAX, Slippage::default()), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_quote_output() {
        let rate = parse_units("0.0001", 18).unwrap();
        let amount_in = parse_units("100", 18).unwrap();
        let out = quote_output(amount_in, 18, rate).unwrap();
        assert_eq!(format_units(out, 18), "0.01");
    }

    #[test]
    fn test_quote_output_rejects_unrepresentable_decimals() {
        let rate = parse_units("0.0001", 18).unwrap();
        assert!(quote_output(U256::from(1u64), 77, rate).is_ok());
        assert_eq!(quote_output(U256::from(1u64), 78, rate), Err(UnitsError::Overflow));
        assert_eq!(quote_output(U256::from(1u64), u8::MAX, rate), Err(UnitsError::Overflow));
    }
}
