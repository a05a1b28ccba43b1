//! Tax withholdings retained from an invoice's gross payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::percent_of;

/// A tax amount retained from the gross payment.
///
/// The value is either derived from a base and a rate, or entered directly.
/// When both base and rate are present, editing either one recomputes the
/// value; a directly entered value is kept as-is until the next rate or base
/// edit.
///
/// # Examples
///
/// ```
/// use payables_core::Withholding;
/// use rust_decimal_macros::dec;
///
/// let mut irrf = Withholding::computed("IRRF", dec!(1000.00), dec!(1.5));
/// assert_eq!(irrf.value, dec!(15.00));
///
/// irrf.set_rate(Some(dec!(4.65)));
/// assert_eq!(irrf.value, dec!(46.50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withholding {
    /// Tax type tag (e.g., "IRRF", "ISS", "PIS/COFINS/CSLL").
    pub kind: String,
    /// Calculation base.
    pub base: Option<Decimal>,
    /// Rate in percent.
    pub rate: Option<Decimal>,
    /// Retained amount.
    pub value: Decimal,
}

impl Withholding {
    /// Create a withholding whose value is derived from base and rate.
    #[must_use]
    pub fn computed(kind: impl Into<String>, base: Decimal, rate: Decimal) -> Self {
        Self {
            kind: kind.into(),
            base: Some(base),
            rate: Some(rate),
            value: percent_of(base, rate),
        }
    }

    /// Create a withholding with a directly entered value.
    #[must_use]
    pub fn fixed(kind: impl Into<String>, value: Decimal) -> Self {
        Self {
            kind: kind.into(),
            base: None,
            rate: None,
            value,
        }
    }

    /// Set the rate, recomputing the value when a base is present.
    pub fn set_rate(&mut self, rate: Option<Decimal>) {
        self.rate = rate;
        self.recompute();
    }

    /// Set the base, recomputing the value when a rate is present.
    pub fn set_base(&mut self, base: Option<Decimal>) {
        self.base = base;
        self.recompute();
    }

    /// Enter the value directly.
    pub fn set_value(&mut self, value: Decimal) {
        self.value = value;
    }

    /// Whether the value is currently derivable from base and rate.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.base.is_some() && self.rate.is_some()
    }

    fn recompute(&mut self) {
        if let (Some(base), Some(rate)) = (self.base, self.rate) {
            self.value = percent_of(base, rate);
        }
    }
}

impl fmt::Display for Withholding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.base, self.rate) {
            (Some(base), Some(rate)) => {
                write!(f, "{} {} ({rate}% of {base})", self.kind, self.value)
            }
            _ => write!(f, "{} {}", self.kind, self.value),
        }
    }
}
