//! Accounts-payable CLI tools.
//!
//! This crate provides command-line tools for working with invoice files:
//!
//! - `ap-check`: Validate invoices before they are saved
//! - `ap-settle`: Settle an installment, splitting off any remainder
//! - `ap-reverse`: Reverse an installment settlement
//! - `ap-allocate`: Edit category or cost-center allocations
//! - `ap-remit`: Export a same-bank remittance file
//!
//! # Example Usage
//!
//! ```bash
//! ap-check invoices.json
//! ap-settle invoices.json --invoice NF-1001 --installment 1 --amount 700,00 --actor ana
//! ap-remit invoices.json --bank-code 341 --company-name "ACME" --company-document 123 -o out.rem
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod report;
