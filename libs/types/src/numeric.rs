//! Fixed-point amounts
//!
//! All on-ledger quantities are unsigned integers. Proportional math is done
//! with an 18-decimal scaling factor and truncating division, so rounding
//! always favours the pool being divided, never the claimant. Products are
//! formed in 256 bits, so only a quotient that does not fit an `Amount`
//! overflows.

use primitive_types::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::errors::NumericError;

/// Ledger amount (payment asset units, token units, dividend units).
pub type Amount = u128;

/// Ledger time in whole seconds since the Unix epoch.
pub type Timestamp = i64;

/// Fixed-point scaling constant, 10^18.
pub const SCALE: Amount = 1_000_000_000_000_000_000;

/// Decimals reported by the ownership token.
pub const TOKEN_DECIMALS: u32 = 18;

/// `a * b / denominator`, truncating toward zero.
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount, NumericError> {
    if denominator == 0 {
        return Err(NumericError::DivisionByZero);
    }
    // Two u128 factors never overflow 256 bits.
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(Amount::MAX) {
        return Err(NumericError::Overflow);
    }
    Ok(quotient.as_u128())
}

/// Checked addition returning the crate's overflow error.
pub fn add(a: Amount, b: Amount) -> Result<Amount, NumericError> {
    a.checked_add(b).ok_or(NumericError::Overflow)
}

/// Checked subtraction returning the crate's underflow error.
pub fn sub(a: Amount, b: Amount) -> Result<Amount, NumericError> {
    a.checked_sub(b).ok_or(NumericError::Underflow)
}

/// Render an integer amount with `decimals` implied decimal places.
///
/// Returns `None` when the amount exceeds what `Decimal` can represent.
pub fn to_units(amount: Amount, decimals: u32) -> Option<Decimal> {
    let signed = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(signed, decimals).ok()
}

/// `numerator / denominator` as a decimal ratio, `None` on a zero denominator
/// or when either side is out of `Decimal` range.
pub fn ratio(numerator: Amount, denominator: Amount) -> Option<Decimal> {
    let n = Decimal::from_u128(numerator)?;
    let d = Decimal::from_u128(denominator)?;
    n.checked_div(d)
}
