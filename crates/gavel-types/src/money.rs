//! Currency amounts.
//!
//! All prices, purses and bids are integers in the smallest currency unit
//! (paise). Conversion to crore is only for display and for reading
//! human-entered catalog values; arithmetic never leaves integers.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::constants::PAISE_PER_CRORE;

/// An amount in the smallest currency unit.
pub type Amount = u64;

/// Render an amount in crore (e.g. `105_000_000` → `10.5`).
#[must_use]
pub fn to_crore(amount: Amount) -> Decimal {
    (Decimal::from(amount) / Decimal::from(PAISE_PER_CRORE)).normalize()
}

/// Parse a crore value into paise.
///
/// Returns `None` for negative values, values with sub-paisa precision, or
/// values that overflow `u64`.
#[must_use]
pub fn from_crore(crore: Decimal) -> Option<Amount> {
    if crore.is_sign_negative() {
        return None;
    }
    let paise = crore.checked_mul(Decimal::from(PAISE_PER_CRORE))?;
    if !paise.fract().is_zero() {
        return None;
    }
    paise.to_u64()
}
