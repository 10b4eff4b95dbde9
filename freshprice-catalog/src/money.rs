//! Rounding and formatting of computed prices.
//!
//! Prices are multiplied as `f64` and only converted to `Decimal` for the
//! final rounding step. The conversion keeps the exact binary value, so a
//! product like `2.675` (stored as 2.67499...) is never treated as a tie.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Prices are quoted in cents
const DECIMAL_PLACES: u32 = 2;

/// How exact midpoints are resolved when rounding to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Banker's rounding: 0.125 -> 0.12, 0.135 -> 0.14
    #[default]
    HalfEven,
    /// Arithmetic rounding: 0.125 -> 0.13
    HalfUp,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Round a raw price to cents.
///
/// Returns `None` when the value is not finite or exceeds what `Decimal`
/// can hold (about 7.9e28).
pub fn round_price(value: f64, mode: RoundingMode) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|exact| exact.round_dp_with_strategy(DECIMAL_PLACES, mode.strategy()))
}

/// From here on prices are written in exponent form (`1e+20`)
const EXPONENT_FROM: i64 = 10_000_000_000_000_000;

/// Render a rounded price the way callers parse it: shortest form, always
/// with a fractional part (`90.0`, `62.99`, `0.5`), switching to exponent
/// form at 1e16 (`1.5e+16`).
pub fn format_price(amount: Decimal) -> String {
    let normalized = amount.normalize();

    if normalized.abs() >= Decimal::from(EXPONENT_FROM) {
        if let Some(value) = normalized.to_f64() {
            let shortest = format!("{value:e}");
            if let Some((mantissa, exponent)) = shortest.split_once('e') {
                return format!("{mantissa}e+{exponent}");
            }
        }
    }

    if normalized.scale() == 0 {
        format!("{normalized}.0")
    } else {
        normalized.to_string()
    }
}
