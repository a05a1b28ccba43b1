//! Payment remittance for payables.
//!
//! Invoices selected for payment are sent to the bank in one remittance
//! file. All selected invoices must share one settlement bank; [`select`]
//! enforces that policy and turns each invoice into a [`RemittanceItem`].
//! Encoding is behind [`RemittanceWriter`]; [`FixedWidthWriter`] produces the
//! 240-column layout.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use payables_core::{Installment, InstallmentId, Invoice};
//! use payables_remittance::{export, select, RemittanceConfig};
//! use rust_decimal_macros::dec;
//!
//! let due = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
//! let invoice = Invoice::new("NF-1", "ACME", dec!(150.00))
//!     .with_bank("341")
//!     .with_barcode("34191790010104351004791020150008291070026000")
//!     .with_installment(Installment::new(InstallmentId(1), dec!(150.00), due));
//!
//! let items = select(&[invoice]).unwrap();
//! let config = RemittanceConfig::builder()
//!     .company_name("Acme Holding")
//!     .company_document("12.345.678/0001-90")
//!     .bank_code("341")
//!     .build();
//! let file = export(&items, &config, due).unwrap();
//! assert_eq!(file.lines().count(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod fixed_width;

pub use config::{RemittanceConfig, RemittanceConfigBuilder};
pub use fixed_width::{FixedWidthWriter, LINE_WIDTH};

use chrono::NaiveDate;
use payables_core::Invoice;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when selecting or exporting a remittance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemittanceError {
    /// Nothing was selected.
    #[error("no invoices selected for remittance")]
    EmptySelection,

    /// An invoice has no settlement bank.
    #[error("invoice {invoice} has no settlement bank")]
    MissingBank {
        /// The invoice id.
        invoice: String,
    },

    /// Selected invoices settle through different banks.
    #[error("invoice {invoice} settles through {found}, but the selection uses {expected}")]
    MixedBanks {
        /// The invoice id.
        invoice: String,
        /// Bank of the first selected invoice.
        expected: String,
        /// Bank of this invoice.
        found: String,
    },

    /// An invoice has no barcode or bank reference.
    #[error("invoice {invoice} has no barcode")]
    MissingBarcode {
        /// The invoice id.
        invoice: String,
    },

    /// An invoice has nothing left to pay.
    #[error("invoice {invoice} has no outstanding amount")]
    NothingOutstanding {
        /// The invoice id.
        invoice: String,
    },

    /// An amount cannot be written into its field.
    #[error("amount {amount} of invoice {invoice} does not fit the remittance layout")]
    AmountOutOfRange {
        /// The invoice id.
        invoice: String,
        /// The amount.
        amount: Decimal,
    },
}

/// One payment line of a remittance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemittanceItem {
    /// Invoice id.
    pub invoice: String,
    /// Supplier reference.
    pub supplier: String,
    /// Settlement bank shared by the whole selection.
    pub bank: String,
    /// Payment barcode or bank reference.
    pub barcode: String,
    /// Earliest due date among open installments.
    pub due_date: NaiveDate,
    /// Outstanding amount.
    pub amount: Decimal,
}

/// Encodes a remittance file.
pub trait RemittanceWriter {
    /// Encode `items` into a file generated on `date`.
    fn write(
        &self,
        items: &[RemittanceItem],
        config: &RemittanceConfig,
        date: NaiveDate,
    ) -> Result<String, RemittanceError>;
}

/// Check the same-bank policy and build one item per invoice.
pub fn select(invoices: &[Invoice]) -> Result<Vec<RemittanceItem>, RemittanceError> {
    let mut expected: Option<&str> = None;
    let mut items = Vec::with_capacity(invoices.len());

    for invoice in invoices {
        let bank = invoice
            .bank
            .as_deref()
            .ok_or_else(|| RemittanceError::MissingBank {
                invoice: invoice.id.clone(),
            })?;
        match expected {
            None => expected = Some(bank),
            Some(first) if first != bank => {
                return Err(RemittanceError::MixedBanks {
                    invoice: invoice.id.clone(),
                    expected: first.to_string(),
                    found: bank.to_string(),
                });
            }
            Some(_) => {}
        }

        let barcode = invoice
            .barcode
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| RemittanceError::MissingBarcode {
                invoice: invoice.id.clone(),
            })?;

        let amount = invoice.outstanding();
        let due_date = invoice
            .installments
            .iter()
            .filter(|i| !i.paid)
            .map(|i| i.due_date)
            .min();
        let Some(due_date) = due_date.filter(|_| amount > Decimal::ZERO) else {
            return Err(RemittanceError::NothingOutstanding {
                invoice: invoice.id.clone(),
            });
        };

        items.push(RemittanceItem {
            invoice: invoice.id.clone(),
            supplier: invoice.supplier.clone(),
            bank: bank.to_string(),
            barcode: barcode.trim().to_string(),
            due_date,
            amount,
        });
    }

    if items.is_empty() {
        return Err(RemittanceError::EmptySelection);
    }
    tracing::debug!(count = items.len(), bank = ?expected, "remittance selected");
    Ok(items)
}

/// Encode `items` with [`FixedWidthWriter`].
pub fn export(
    items: &[RemittanceItem],
    config: &RemittanceConfig,
    date: NaiveDate,
) -> Result<String, RemittanceError> {
    FixedWidthWriter.write(items, config, date)
}
