//! Deterministic rendering of monetary amounts, percentages and quantities.
//!
//! All values are [`Decimal`], so rendering never goes through binary
//! floating point and never produces scientific notation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round to two decimals, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Render a monetary amount: always two decimals, dot separator, no grouping.
pub fn money(value: Decimal) -> String {
    round_money(value).to_string()
}

/// Render a percentage without trailing zero padding (`15`, `12.5`).
pub fn percent(value: Decimal) -> String {
    trimmed(value)
}

/// Render a quantity without trailing fractional zeros.
pub fn quantity(value: Decimal) -> String {
    trimmed(value)
}

fn trimmed(value: Decimal) -> String {
    let mut normalized = value.normalize();
    if normalized.is_zero() {
        normalized.set_sign_positive(true);
    }
    normalized.to_string()
}
