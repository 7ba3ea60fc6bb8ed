//! Conversions between the `f64` values stored in records and the
//! `Decimal` values used for accumulation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Non-finite values and magnitudes beyond `Decimal::MAX` collapse to zero.
/// Stored measurements are bounded well inside that range.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round half away from zero to `dp` places and convert.
pub fn round_f64(value: Decimal, dp: u32) -> f64 {
    to_f64(value.round_dp(dp))
}
