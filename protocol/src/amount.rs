//! Monetary amounts in minor units.
//!
//! Prices travel as `i128` integers scaled by [`MINOR_UNITS_PER_UNIT`].
//! User input arrives as decimal text ("2.5") and is converted with integer
//! arithmetic only; floats never touch a price.

use thiserror::Error;

use crate::config::{AMOUNT_DECIMALS, MINOR_UNITS_PER_UNIT, ROYALTY_PERCENT};

/// Errors produced while parsing a decimal amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Nothing to parse.
    #[error("amount is empty")]
    Empty,

    /// A character other than digits, one '.', or a leading sign.
    #[error("invalid amount: {0}")]
    Invalid(String),

    /// The scaled value does not fit in an `i128`.
    #[error("amount out of range: {0}")]
    Overflow(String),
}

/// Parses a decimal string in major units into minor units.
///
/// Digits beyond the seventh fractional place are rounded half away from
/// zero, matching how the marketplace has always scaled user input.
pub fn parse_major(input: &str) -> Result<i128, AmountError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Invalid(input.to_string()));
    }

    let overflow = || AmountError::Overflow(input.to_string());

    let whole_value: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };

    let decimals = AMOUNT_DECIMALS as usize;
    let (kept, dropped) = fraction.split_at(fraction.len().min(decimals));
    let mut fraction_value: i128 = 0;
    for digit in kept.bytes() {
        fraction_value = fraction_value * 10 + i128::from(digit - b'0');
    }
    for _ in kept.len()..decimals {
        fraction_value *= 10;
    }
    if dropped.as_bytes().first().is_some_and(|d| *d >= b'5') {
        fraction_value += 1;
    }

    let magnitude = whole_value
        .checked_mul(MINOR_UNITS_PER_UNIT)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(overflow)?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Renders minor units as major units with all seven fractional digits.
pub fn format_major(minor: i128) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let magnitude = minor.unsigned_abs();
    let scale = MINOR_UNITS_PER_UNIT as u128;
    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / scale,
        magnitude % scale,
        width = AMOUNT_DECIMALS as usize
    )
}

/// Converts minor units to a float, for display arithmetic only.
pub fn to_major(minor: i128) -> f64 {
    minor as f64 / MINOR_UNITS_PER_UNIT as f64
}

/// Portion of a secondary sale paid to the original seller.
pub fn royalty_share(price: i128) -> i128 {
    price * ROYALTY_PERCENT / 100
}

/// Resale markup over the original purchase price, in percent.
///
/// Returns `None` when the original price is zero.
pub fn markup_percent(resale: i128, original: i128) -> Option<f64> {
    if original == 0 {
        return None;
    }
    Some((resale as f64 / original as f64 - 1.0) * 100.0)
}
