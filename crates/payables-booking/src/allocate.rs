//! Dual-mode allocation balancing.
//!
//! Keeps a list of [`AllocationEntry`] consistent against one target amount
//! while the operator fills either percentages or absolute values. The same
//! logic serves category allocations (target: gross) and cost-center rateio
//! (target: net); see [`AllocationKind`].

use payables_core::money::{
    is_near, non_negative, percent_of, round2, share_of, HUNDRED, PERCENT_TOLERANCE,
    VALUE_TOLERANCE,
};
use payables_core::{AllocationEntry, Invoice};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when editing an allocation list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The edited index does not exist.
    #[error("allocation entry {index} out of range (list has {len} entries)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the list.
        len: usize,
    },
}

/// Which allocation list of an invoice, and the amount it is balanced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationKind {
    /// Expense categories, balanced against the gross amount.
    Category,
    /// Cost centers (rateio), balanced against the net amount.
    CostCenter,
}

impl AllocationKind {
    /// The amount entries of this kind must sum to.
    #[must_use]
    pub const fn target(&self, invoice: &Invoice) -> Decimal {
        match self {
            Self::Category => invoice.gross(),
            Self::CostCenter => invoice.net(),
        }
    }

    /// The entries of this kind.
    #[must_use]
    pub fn entries<'a>(&self, invoice: &'a Invoice) -> &'a [AllocationEntry] {
        match self {
            Self::Category => &invoice.categories,
            Self::CostCenter => &invoice.cost_centers,
        }
    }

    fn entries_mut<'a>(&self, invoice: &'a mut Invoice) -> &'a mut Vec<AllocationEntry> {
        match self {
            Self::Category => &mut invoice.categories,
            Self::CostCenter => &mut invoice.cost_centers,
        }
    }
}

impl fmt::Display for AllocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => f.write_str("category"),
            Self::CostCenter => f.write_str("cost-center"),
        }
    }
}

/// An operator edit to one allocation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationEdit {
    /// A percentage was typed.
    Percentage(Decimal),
    /// An absolute value was typed.
    Value(Decimal),
}

/// Totals of an allocation list against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationSummary {
    /// Sum of filled percentages.
    pub percentage_total: Decimal,
    /// Sum of filled values.
    pub value_total: Decimal,
    /// `100 - percentage_total`.
    pub percentage_residual: Decimal,
    /// `target - value_total`.
    pub value_residual: Decimal,
    /// Whether the list is balanced.
    pub balanced: bool,
}

/// Set the percentage of the entry at `index`.
///
/// When `target` is positive, the entry's value is derived as
/// `round2(target * pct / 100)`. Auto-completion runs afterwards. The input
/// list is not modified.
pub fn set_percentage(
    list: &[AllocationEntry],
    index: usize,
    pct: Decimal,
    target: Decimal,
) -> Result<Vec<AllocationEntry>, AllocationError> {
    let mut result = list.to_vec();
    let entry = entry_mut(&mut result, index)?;
    entry.percentage = Some(pct);
    if target > Decimal::ZERO {
        entry.value = Some(percent_of(target, pct));
    }
    autocomplete(&mut result, target);
    Ok(result)
}

/// Set the value of the entry at `index`.
///
/// When `target` is positive, the entry's percentage is derived as
/// `round2(val * 100 / target)`. Auto-completion runs afterwards. The input
/// list is not modified.
pub fn set_value(
    list: &[AllocationEntry],
    index: usize,
    val: Decimal,
    target: Decimal,
) -> Result<Vec<AllocationEntry>, AllocationError> {
    let mut result = list.to_vec();
    let entry = entry_mut(&mut result, index)?;
    entry.value = Some(val);
    if let Some(pct) = share_of(val, target) {
        entry.percentage = Some(pct);
    }
    autocomplete(&mut result, target);
    Ok(result)
}

fn entry_mut(
    list: &mut [AllocationEntry],
    index: usize,
) -> Result<&mut AllocationEntry, AllocationError> {
    let len = list.len();
    list.get_mut(index)
        .ok_or(AllocationError::IndexOutOfRange { index, len })
}

/// Fill a single blank percentage and a single blank value.
///
/// If exactly one entry has no percentage, it receives `100 - Σ others`
/// floored at zero. Independently, if exactly one entry has no value, it
/// receives `target - Σ others` floored at zero. With zero or several blanks
/// nothing is guessed.
///
/// Returns the indices that were filled.
pub fn autocomplete(list: &mut [AllocationEntry], target: Decimal) -> Vec<usize> {
    let mut filled = Vec::new();

    if let Some(index) = single_blank(list, |e| e.percentage) {
        let others: Decimal = list.iter().filter_map(|e| e.percentage).sum();
        list[index].percentage = Some(non_negative(round2(HUNDRED - others)));
        filled.push(index);
    }

    if let Some(index) = single_blank(list, |e| e.value) {
        let others: Decimal = list.iter().filter_map(|e| e.value).sum();
        list[index].value = Some(non_negative(round2(target - others)));
        if !filled.contains(&index) {
            filled.push(index);
        }
    }

    filled
}

fn single_blank(
    list: &[AllocationEntry],
    field: impl Fn(&AllocationEntry) -> Option<Decimal>,
) -> Option<usize> {
    let mut blanks = list
        .iter()
        .enumerate()
        .filter(|(_, e)| field(e).is_none())
        .map(|(i, _)| i);
    match (blanks.next(), blanks.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}

/// Check whether a list is balanced against `target`.
///
/// True when the list is non-empty and either the percentages sum to 100
/// (within 0.001) or the values sum to `target` (within 0.01). The two
/// representations do not have to agree with each other.
#[must_use]
pub fn is_balanced(list: &[AllocationEntry], target: Decimal) -> bool {
    summarize(list, target).balanced
}

/// Compute totals and residuals of a list against `target`.
#[must_use]
pub fn summarize(list: &[AllocationEntry], target: Decimal) -> AllocationSummary {
    let percentage_total: Decimal = list.iter().filter_map(|e| e.percentage).sum();
    let value_total: Decimal = list.iter().filter_map(|e| e.value).sum();
    let balanced = !list.is_empty()
        && (is_near(percentage_total, HUNDRED, PERCENT_TOLERANCE)
            || is_near(value_total, target, VALUE_TOLERANCE));

    AllocationSummary {
        percentage_total,
        value_total,
        percentage_residual: HUNDRED - percentage_total,
        value_residual: target - value_total,
        balanced,
    }
}

/// Apply an edit to one allocation list of an invoice.
///
/// The target is read from the invoice (gross or net, per `kind`). Returns
/// a new invoice; the input is untouched.
pub fn apply_edit(
    invoice: &Invoice,
    kind: AllocationKind,
    index: usize,
    edit: AllocationEdit,
) -> Result<Invoice, AllocationError> {
    let target = kind.target(invoice);
    let entries = kind.entries(invoice);
    let updated = match edit {
        AllocationEdit::Percentage(pct) => set_percentage(entries, index, pct, target)?,
        AllocationEdit::Value(val) => set_value(entries, index, val, target)?,
    };

    let mut result = invoice.clone();
    *kind.entries_mut(&mut result) = updated;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn blank(labels: &[&str]) -> Vec<AllocationEntry> {
        labels.iter().map(|l| AllocationEntry::new(*l)).collect()
    }

    #[test]
    fn test_set_percentage_derives_value_and_completes() {
        let list = blank(&["Ops", "Sales"]);
        let result = set_percentage(&list, 0, dec!(60), dec!(1000.00)).unwrap();

        assert_eq!(result[0].percentage, Some(dec!(60)));
        assert_eq!(result[0].value, Some(dec!(600.00)));
        assert_eq!(result[1].percentage, Some(dec!(40.00)));
        assert_eq!(result[1].value, Some(dec!(400.00)));
        assert!(is_balanced(&result, dec!(1000.00)));

        // input untouched
        assert_eq!(list, blank(&["Ops", "Sales"]));
    }

    #[test]
    fn test_set_value_derives_percentage() {
        let list = blank(&["Ops", "Sales", "R&D"]);
        let result = set_value(&list, 1, dec!(250.00), dec!(1000.00)).unwrap();

        assert_eq!(result[1].value, Some(dec!(250.00)));
        assert_eq!(result[1].percentage, Some(dec!(25.00)));
        // two blanks left in each column: nothing guessed
        assert_eq!(result[0], AllocationEntry::new("Ops"));
        assert_eq!(result[2], AllocationEntry::new("R&D"));
    }

    #[test]
    fn test_zero_target_does_not_derive() {
        let list = blank(&["Ops", "Sales"]);
        let result = set_percentage(&list, 0, dec!(30), Decimal::ZERO).unwrap();
        // value column: two blanks, not derived, not completed
        assert_eq!(result[0].value, None);
        assert_eq!(result[1].percentage, Some(dec!(70.00)));

        let result = set_value(&list, 0, dec!(30), Decimal::ZERO).unwrap();
        assert_eq!(result[0].percentage, None);
        assert_eq!(result[1].value, Some(dec!(0)));
    }

    #[test]
    fn test_autocomplete_floors_at_zero() {
        let mut list = vec![
            AllocationEntry::new("A").with_percentage(dec!(80)).with_value(dec!(900)),
            AllocationEntry::new("B").with_percentage(dec!(30)).with_value(dec!(300)),
            AllocationEntry::new("C"),
        ];
        let filled = autocomplete(&mut list, dec!(1000));
        assert_eq!(filled, vec![2]);
        assert_eq!(list[2].percentage, Some(dec!(0)));
        assert_eq!(list[2].value, Some(dec!(0)));
    }

    #[test]
    fn test_autocomplete_no_blanks_no_change() {
        let mut list = vec![
            AllocationEntry::new("A").with_percentage(dec!(30)).with_value(dec!(30)),
            AllocationEntry::new("B").with_percentage(dec!(30)).with_value(dec!(30)),
        ];
        let before = list.clone();
        assert!(autocomplete(&mut list, dec!(100)).is_empty());
        assert_eq!(list, before);
        assert!(!is_balanced(&list, dec!(100)));
    }

    #[test]
    fn test_autocomplete_columns_independent() {
        let mut list = vec![
            AllocationEntry::new("A").with_value(dec!(100)),
            AllocationEntry::new("B").with_percentage(dec!(10)),
        ];
        let filled = autocomplete(&mut list, dec!(500));
        assert_eq!(filled, vec![0, 1]);
        assert_eq!(list[0].percentage, Some(dec!(90.00)));
        assert_eq!(list[1].value, Some(dec!(400.00)));
    }

    #[test]
    fn test_index_out_of_range() {
        let list = blank(&["Ops"]);
        assert_eq!(
            set_value(&list, 3, dec!(1), dec!(10)),
            Err(AllocationError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_is_balanced_either_representation() {
        let by_pct = vec![
            AllocationEntry::new("A").with_percentage(dec!(33.3333)),
            AllocationEntry::new("B").with_percentage(dec!(66.6666)),
        ];
        // 99.9999 is within 0.001 of 100
        assert!(is_balanced(&by_pct, dec!(1000)));

        let by_value = vec![
            AllocationEntry::new("A").with_value(dec!(500.00)).with_percentage(dec!(10)),
            AllocationEntry::new("B").with_value(dec!(499.995)),
        ];
        // percentages disagree, but values are within a cent
        assert!(is_balanced(&by_value, dec!(1000.00)));

        let off = vec![AllocationEntry::new("A").with_value(dec!(999.99))];
        assert!(!is_balanced(&off, dec!(1000.00)));
    }

    #[test]
    fn test_empty_list_never_balanced() {
        assert!(!is_balanced(&[], dec!(0)));
        let summary = summarize(&[], dec!(0));
        assert!(!summary.balanced);
        assert_eq!(summary.percentage_residual, dec!(100));
    }

    #[test]
    fn test_summarize_residuals() {
        let list = vec![
            AllocationEntry::new("A").with_percentage(dec!(60)).with_value(dec!(600)),
            AllocationEntry::new("B").with_percentage(dec!(30)).with_value(dec!(300)),
        ];
        let summary = summarize(&list, dec!(1000));
        assert_eq!(summary.percentage_total, dec!(90));
        assert_eq!(summary.percentage_residual, dec!(10));
        assert_eq!(summary.value_residual, dec!(100));
        assert!(!summary.balanced);
    }

    #[test]
    fn test_apply_edit_uses_kind_target() {
        let mut invoice = Invoice::new("NF-1", "ACME", dec!(1000.00));
        invoice.set_discount(dec!(200.00));
        invoice.categories = blank(&["Services", "Goods"]);
        invoice.cost_centers = blank(&["Ops", "Sales"]);

        let invoice = apply_edit(
            &invoice,
            AllocationKind::Category,
            0,
            AllocationEdit::Percentage(dec!(50)),
        )
        .unwrap();
        assert_eq!(invoice.categories[0].value, Some(dec!(500.00)));

        let invoice = apply_edit(
            &invoice,
            AllocationKind::CostCenter,
            0,
            AllocationEdit::Percentage(dec!(50)),
        )
        .unwrap();
        assert_eq!(invoice.cost_centers[0].value, Some(dec!(400.00)));
        assert_eq!(invoice.cost_centers[1].value, Some(dec!(400.00)));
        assert!(is_balanced(&invoice.cost_centers, invoice.net()));
    }
}
