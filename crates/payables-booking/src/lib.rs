//! Payables booking engine.
//!
//! This crate provides:
//! - Dual-mode allocation balancing (percentage or value entry per line)
//! - Installment settlement with remainder split
//! - Settlement reversal
//!
//! # Allocation
//!
//! Each allocation entry carries a percentage and a value against a target
//! amount (gross for categories, net for cost centers). Editing one derives
//! the other; when exactly one entry has a blank percentage or value, it is
//! filled so the list balances.
//!
//! ```
//! use payables_booking::{set_percentage, is_balanced};
//! use payables_core::AllocationEntry;
//! use rust_decimal_macros::dec;
//!
//! let list = vec![AllocationEntry::new("Rent"), AllocationEntry::new("Energy")];
//! let list = set_percentage(&list, 0, dec!(60), dec!(1000.00)).unwrap();
//! assert_eq!(list[1].percentage, Some(dec!(40.00)));
//! assert_eq!(list[1].value, Some(dec!(400.00)));
//! assert!(is_balanced(&list, dec!(1000.00)));
//! ```
//!
//! # Settlement
//!
//! Operations take an invoice by reference and return the updated invoice
//! along with an audit record. A rejected operation leaves the input as it was.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allocate;
mod settle;

pub use allocate::{
    apply_edit, autocomplete, is_balanced, set_percentage, set_value, summarize, AllocationEdit,
    AllocationError, AllocationKind, AllocationSummary,
};
pub use settle::{
    remainder_of, renumber, reverse, settle, ReversalError, ReversalResult, Settlement,
    SettlementError, SettlementResult,
};
