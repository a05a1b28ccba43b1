//! Allocation entries shared by category and cost-center decompositions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One labeled share of an amount.
///
/// A share is expressed as a percentage, an absolute value, or both. Either
/// field may be blank while the operator is still filling in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Category or cost-center name.
    pub label: String,
    /// Share in percent.
    pub percentage: Option<Decimal>,
    /// Share as an absolute amount.
    pub value: Option<Decimal>,
    /// Free-form note.
    pub note: Option<String>,
}

impl AllocationEntry {
    /// Create a blank entry.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            percentage: None,
            value: None,
            note: None,
        }
    }

    /// Set the percentage.
    #[must_use]
    pub const fn with_percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Set the value.
    #[must_use]
    pub const fn with_value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
