//! JSON loader for payables invoices.
//!
//! This crate is the edge where untrusted payloads become typed records.
//! A document is either a single invoice object or an array of them.
//!
//! # Features
//!
//! - Amounts as numbers or strings in either decimal convention
//! - Dates as `YYYY-MM-DD` or `DD/MM/YYYY`
//! - Free-text status with common aliases
//! - Installment ids assigned and sequence labels renumbered on load
//! - Duplicate installment ids rejected
//! - Declared net amounts checked against the derived net
//!
//! # Example
//!
//! ```
//! use payables_loader::load_str;
//! use rust_decimal_macros::dec;
//!
//! let invoices = load_str(r#"{
//!     "id": "NF-1001",
//!     "supplier": "ACME Ltda",
//!     "gross": "R$ 1.000,00",
//!     "withholdings": [{ "kind": "ISS", "value": "50,00" }],
//!     "net": 950
//! }"#).unwrap();
//! assert_eq!(invoices[0].net(), dec!(950.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod raw;

pub use raw::{
    parse_amount, parse_date, RawAllocation, RawAmount, RawInstallment, RawInvoice,
    RawWithholding,
};

use payables_core::{InstallmentId, Invoice};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the expected shape.
    #[error("invalid invoice document: {0}")]
    Json(#[from] serde_json::Error),

    /// An amount could not be parsed.
    #[error("invoice {invoice}: invalid amount {value:?} in {field}")]
    InvalidAmount {
        /// The invoice id.
        invoice: String,
        /// Path of the offending field.
        field: String,
        /// The raw text.
        value: String,
    },

    /// A date could not be parsed.
    #[error("invoice {invoice}: invalid date {value:?} in {field}")]
    InvalidDate {
        /// The invoice id.
        invoice: String,
        /// Path of the offending field.
        field: String,
        /// The raw text.
        value: String,
    },

    /// The status text is not recognized.
    #[error("invoice {invoice}: unknown status {status:?}")]
    UnknownStatus {
        /// The invoice id.
        invoice: String,
        /// The raw status text.
        status: String,
    },

    /// A required field is absent.
    #[error("invoice {invoice}: missing {field}")]
    MissingField {
        /// The invoice id.
        invoice: String,
        /// Path of the missing field.
        field: String,
    },

    /// Two installments of one invoice carry the same id.
    #[error("invoice {invoice}: installment {id} used more than once")]
    DuplicateInstallmentId {
        /// The invoice id.
        invoice: String,
        /// The repeated installment id.
        id: InstallmentId,
    },

    /// The declared net amount disagrees with the derived one.
    #[error("invoice {invoice}: declared net {declared} does not match derived net {derived}")]
    InconsistentNet {
        /// The invoice id.
        invoice: String,
        /// Net amount found in the payload.
        declared: Decimal,
        /// Net amount derived from gross, discount and withholdings.
        derived: Decimal,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Many(Vec<RawInvoice>),
    One(Box<RawInvoice>),
}

/// Load invoices from a JSON string.
pub fn load_str(source: &str) -> Result<Vec<Invoice>, LoadError> {
    let raw = match serde_json::from_str(source)? {
        RawDocument::Many(raw) => raw,
        RawDocument::One(raw) => vec![*raw],
    };
    raw.into_iter().map(RawInvoice::into_invoice).collect()
}

/// Load invoices from a JSON file.
pub fn load_file(path: &Path) -> Result<Vec<Invoice>, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_str(&source)
}

/// Serialize one invoice as pretty JSON.
pub fn to_json(invoice: &Invoice) -> Result<String, LoadError> {
    Ok(serde_json::to_string_pretty(invoice)?)
}

/// Serialize invoices as a pretty JSON array.
pub fn to_json_all(invoices: &[Invoice]) -> Result<String, LoadError> {
    Ok(serde_json::to_string_pretty(invoices)?)
}

/// Write invoices to a JSON file.
pub fn save_file(path: &Path, invoices: &[Invoice]) -> Result<(), LoadError> {
    let json = to_json_all(invoices)?;
    fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
