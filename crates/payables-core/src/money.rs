//! Rounding and tolerance helpers for monetary values.
//!
//! Every amount in the engine is a [`Decimal`]. Derived values are rounded
//! with [`round2`] at the point they are produced, so repeated derivations
//! (net, allocation shares, settlement remainders) never drift by a cent.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Tolerance used when comparing an applied settlement against the outstanding balance.
pub const SETTLEMENT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Tolerance used when comparing a sum of values against a target amount.
pub const VALUE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Tolerance used when comparing a sum of percentages against 100.
pub const PERCENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// One hundred percent.
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to two decimal places, half away from zero.
///
/// ```
/// use payables_core::money::round2;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round2(dec!(2.345)), dec!(2.35));
/// assert_eq!(round2(dec!(-2.345)), dec!(-2.35));
/// assert_eq!(round2(dec!(2.344)), dec!(2.34));
/// ```
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `round2(base * rate / 100)`.
#[must_use]
pub fn percent_of(base: Decimal, rate: Decimal) -> Decimal {
    round2(base * rate / HUNDRED)
}

/// The share `value` represents of `target`, as a rounded percentage.
///
/// Returns `None` when `target` is not positive.
#[must_use]
pub fn share_of(value: Decimal, target: Decimal) -> Option<Decimal> {
    if target > Decimal::ZERO {
        Some(round2(value * HUNDRED / target))
    } else {
        None
    }
}

/// Check whether two amounts are within `tolerance` of each other (exclusive).
#[must_use]
pub fn is_near(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() < tolerance
}

/// Convert an amount to an integer number of cents.
///
/// Returns `None` if the value does not fit in an `i64`.
#[must_use]
pub fn to_cents(value: Decimal) -> Option<i64> {
    round2(value).checked_mul(HUNDRED)?.trunc().to_i64()
}

/// Floor a value at zero.
#[must_use]
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
