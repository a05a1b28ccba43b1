//! Audit trail emitter for payables.
//!
//! Turns completed mutations into normalized [`AuditRecord`]s. The emitter is
//! pure: actor identity and timestamp arrive in an [`AuditContext`], and the
//! records it returns are handed to an external store.
//!
//! - [`diff`] compares two snapshots of an [`Auditable`] record
//! - [`event`] records a discrete action (settlement, reversal) with JSON snapshots
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use payables_audit::{diff, AuditAction, AuditContext, FieldLabels};
//! use payables_core::Invoice;
//! use rust_decimal_macros::dec;
//!
//! let ctx = AuditContext::new("ana", Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
//! let before = Invoice::new("NF-1", "ACME", dec!(100.00));
//! let mut after = before.clone();
//! after.set_discount(dec!(5.00));
//!
//! let records = diff(&before, &after, &FieldLabels::invoice_defaults(), &ctx);
//! assert_eq!(records.len(), 2); // discount and net
//! assert_eq!(records[0].action(), AuditAction::Update);
//! assert_eq!(records[0].field(), Some("Discount"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod diff;
mod record;

pub use diff::{diff, event, AuditError, Auditable, Fingerprint};
pub use record::{AuditAction, AuditContext, AuditRecord, FieldLabels};
