//! Net amount reconciliation.
//!
//! The net payable amount is the authoritative bottom line of an invoice:
//! `round2(gross - discount - Σ withholding.value)`. It is never entered
//! directly. Negative results are allowed here; rejecting them is left to
//! validation.

use rust_decimal::Decimal;

use crate::money::{is_near, round2, VALUE_TOLERANCE};
use crate::Withholding;

/// Compute the net payable amount.
///
/// # Example
///
/// ```
/// use payables_core::{compute_net, Withholding};
/// use rust_decimal_macros::dec;
///
/// let withholdings = [
///     Withholding::computed("IRRF", dec!(1000.00), dec!(1.5)),
///     Withholding::fixed("ISS", dec!(50.00)),
/// ];
/// assert_eq!(compute_net(dec!(1000.00), dec!(10.00), &withholdings), dec!(925.00));
/// ```
#[must_use]
pub fn compute_net(gross: Decimal, discount: Decimal, withholdings: &[Withholding]) -> Decimal {
    let retained: Decimal = withholdings.iter().map(|w| w.value).sum();
    round2(gross - discount - retained)
}

/// Check a net amount supplied from outside against the derived one.
///
/// Returns `true` when `declared` rounds to within a cent of `derived`.
#[must_use]
pub fn net_matches(declared: Decimal, derived: Decimal) -> bool {
    is_near(round2(declared), derived, VALUE_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_withholdings() {
        assert_eq!(compute_net(dec!(100.00), dec!(0), &[]), dec!(100.00));
    }

    #[test]
    fn test_may_be_negative() {
        let w = [Withholding::fixed("IRRF", dec!(80.00))];
        assert_eq!(compute_net(dec!(100.00), dec!(30.00), &w), dec!(-10.00));
    }

    #[test]
    fn test_rounds_sub_cent_inputs() {
        let w = [Withholding::fixed("ISS", dec!(0.004))];
        assert_eq!(compute_net(dec!(10.001), dec!(0), &w), dec!(10.00));
        assert_eq!(compute_net(dec!(10.005), dec!(0), &[]), dec!(10.01));
    }

    #[test]
    fn test_net_matches() {
        assert!(net_matches(dec!(925.00), dec!(925.00)));
        assert!(net_matches(dec!(924.996), dec!(925.00)));
        assert!(!net_matches(dec!(924.99), dec!(925.00)));
    }
}
