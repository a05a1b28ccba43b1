//! Core types for payables
//!
//! This crate provides the typed records and monetary arithmetic shared by the
//! accounts-payable engine:
//!
//! - [`Invoice`] - An accounts-payable record with a derived net amount
//! - [`Withholding`] - A tax amount retained from the gross payment
//! - [`AllocationEntry`] - A labeled share of an amount (category or cost center)
//! - [`Installment`] - One scheduled payment unit of an invoice
//! - [`compute_net`] - The authoritative net amount reconciliation
//! - [`money`] - Rounding and tolerance helpers
//!
//! # Example
//!
//! ```
//! use payables_core::{Installment, InstallmentId, Invoice, Withholding};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let due = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
//! let mut invoice = Invoice::new("NF-1001", "ACME Ltda", dec!(1000.00))
//!     .with_installment(Installment::new(InstallmentId(1), dec!(1000.00), due));
//!
//! invoice.push_withholding(Withholding::fixed("ISS", dec!(50.00)));
//! assert_eq!(invoice.net(), dec!(950.00));
//! assert_eq!(invoice.outstanding(), dec!(1000.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allocation;
pub mod format;
pub mod installment;
pub mod invoice;
pub mod money;
pub mod reconcile;
pub mod withholding;

pub use allocation::AllocationEntry;
pub use format::{format_invoice, FormatConfig};
pub use installment::{Installment, InstallmentId, InstallmentState, Sequence};
pub use invoice::{Invoice, InvoiceStatus, UnknownStatus};
pub use money::round2;
pub use reconcile::{compute_net, net_matches};
pub use withholding::Withholding;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
