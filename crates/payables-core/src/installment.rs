//! Payment installments.
//!
//! An [`Installment`] is one scheduled payment unit of an invoice. The
//! invoice owns its installments; [`Installment::split_from`] is a plain
//! same-invoice reference used to find the remainder a partial settlement
//! produced.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an installment within its invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallmentId(pub u64);

impl fmt::Display for InstallmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequence label `k/n` of an installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// One-based position in the list.
    pub number: usize,
    /// Length of the list when the label was assigned.
    pub of: usize,
}

impl Sequence {
    /// Create a sequence label.
    #[must_use]
    pub const fn new(number: usize, of: usize) -> Self {
        Self { number, of }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.of)
    }
}

/// Settlement state of an installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallmentState {
    /// Unpaid.
    Open,
    /// Paid.
    Settled,
}

/// One scheduled payment unit of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Stable identity.
    pub id: InstallmentId,
    /// Sequence label, recomputed whenever the list length changes.
    #[serde(default)]
    pub sequence: Sequence,
    /// Current value. For a settled installment, the amount actually settled.
    pub value: Decimal,
    /// Value at creation, restored on reversal.
    pub original_value: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Whether the installment has been settled.
    #[serde(default)]
    pub paid: bool,
    /// Date the settlement was made.
    pub payment_date: Option<NaiveDate>,
    /// Bank the settlement was made through.
    pub bank: Option<String>,
    /// Installment this one was split out of by a partial settlement.
    pub split_from: Option<InstallmentId>,
}

impl Installment {
    /// Create an open installment. The original value is taken from `value`.
    #[must_use]
    pub const fn new(id: InstallmentId, value: Decimal, due_date: NaiveDate) -> Self {
        Self {
            id,
            sequence: Sequence::new(1, 1),
            value,
            original_value: value,
            due_date,
            paid: false,
            payment_date: None,
            bank: None,
            split_from: None,
        }
    }

    /// Create the open remainder of a partial settlement of `parent`.
    #[must_use]
    pub fn remainder_of(parent: &Self, id: InstallmentId, value: Decimal) -> Self {
        let mut remainder = Self::new(id, value, parent.due_date);
        remainder.split_from = Some(parent.id);
        remainder
    }

    /// Settlement state.
    #[must_use]
    pub const fn state(&self) -> InstallmentState {
        if self.paid {
            InstallmentState::Settled
        } else {
            InstallmentState::Open
        }
    }

    /// Outstanding balance: the value if open, zero if paid.
    #[must_use]
    pub const fn outstanding(&self) -> Decimal {
        if self.paid {
            Decimal::ZERO
        } else {
            self.value
        }
    }
}
