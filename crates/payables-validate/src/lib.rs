//! Pre-save validation for payables invoices.
//!
//! Checks an [`Invoice`] for conditions that must be fixed before it is
//! persisted (errors) or that deserve the operator's attention (warnings).
//!
//! # Error Codes
//!
//! | Code | Description |
//! |------|-------------|
//! | E1001 | Category allocation not balanced against gross |
//! | E1002 | Cost-center allocation not balanced against net |
//! | E2001 | Declared net differs from the derived net |
//! | E2002 | Net amount is negative (warning) |
//! | E3001 | Installment total differs from net (warning) |
//! | E3002 | Installment sequence labels out of date |
//! | E3003 | Remainder references a missing installment (warning) |
//! | E3004 | Status disagrees with installment settlement |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use payables_booking::{summarize, AllocationKind};
use payables_core::money::SETTLEMENT_EPSILON;
use payables_core::{net_matches, Invoice, InvoiceStatus};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // === Allocation Errors (E1xxx) ===
    /// E1001: Categories do not balance against the gross amount.
    CategoriesUnbalanced,
    /// E1002: Cost centers do not balance against the net amount.
    CostCentersUnbalanced,

    // === Amount Errors (E2xxx) ===
    /// E2001: A declared net amount disagrees with the derived one.
    InconsistentNet,
    /// E2002: Net amount is negative (warning).
    NegativeNet,

    // === Installment Errors (E3xxx) ===
    /// E3001: Installment total differs from the net amount (warning).
    InstallmentTotalMismatch,
    /// E3002: Sequence labels do not match list positions.
    StaleSequence,
    /// E3003: `split_from` points at an installment not in the list (warning).
    DanglingRemainder,
    /// E3004: Invoice status disagrees with installment settlement.
    StatusMismatch,
}

impl ErrorCode {
    /// Get the error code string (e.g., "E1001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CategoriesUnbalanced => "E1001",
            Self::CostCentersUnbalanced => "E1002",
            Self::InconsistentNet => "E2001",
            Self::NegativeNet => "E2002",
            Self::InstallmentTotalMismatch => "E3001",
            Self::StaleSequence => "E3002",
            Self::DanglingRemainder => "E3003",
            Self::StatusMismatch => "E3004",
        }
    }

    /// Check if this is a warning (not an error).
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::NegativeNet | Self::InstallmentTotalMismatch | Self::DanglingRemainder
        )
    }

    /// Get the severity level.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        if self.is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Severity level for validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Invoice must not be saved.
    Error,
    /// Suspicious but savable.
    Warning,
    /// Informational only.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// A validation error.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct ValidationError {
    /// Error code.
    pub code: ErrorCode,
    /// Error message.
    pub message: String,
    /// Id of the invoice that caused the error.
    pub invoice: String,
    /// Additional context.
    pub context: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>, invoice: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            invoice: invoice.into(),
            context: None,
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Severity of this error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.code.severity()
    }
}

/// Validation options.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Whether an empty allocation list counts as unbalanced.
    pub require_allocations: bool,
    /// Whether to compare the installment total with the net amount.
    pub check_installment_total: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            require_allocations: true,
            check_installment_total: true,
        }
    }
}

/// Validate an invoice.
///
/// Returns a list of validation errors found.
pub fn validate(invoice: &Invoice) -> Vec<ValidationError> {
    validate_with_options(invoice, &ValidationOptions::default())
}

/// Validate an invoice with custom options.
///
/// Returns a list of validation errors and warnings found.
pub fn validate_with_options(
    invoice: &Invoice,
    options: &ValidationOptions,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_allocations(invoice, AllocationKind::Category, options, &mut errors);
    validate_allocations(invoice, AllocationKind::CostCenter, options, &mut errors);

    if invoice.net() < Decimal::ZERO {
        errors.push(ValidationError::new(
            ErrorCode::NegativeNet,
            format!("Net amount is negative: {}", invoice.net()),
            &invoice.id,
        ));
    }

    validate_installments(invoice, options, &mut errors);
    validate_status(invoice, &mut errors);

    errors
}

/// Validate many invoices in parallel.
///
/// Results are returned in input order.
pub fn validate_all(
    invoices: &[Invoice],
    options: &ValidationOptions,
) -> Vec<Vec<ValidationError>> {
    invoices
        .par_iter()
        .map(|invoice| validate_with_options(invoice, options))
        .collect()
}

/// Check a net amount declared by an external source against the derived one.
#[must_use]
pub fn validate_declared_net(invoice: &Invoice, declared: Decimal) -> Option<ValidationError> {
    if net_matches(declared, invoice.net()) {
        return None;
    }
    Some(
        ValidationError::new(
            ErrorCode::InconsistentNet,
            format!(
                "Declared net {declared} does not match derived net {}",
                invoice.net()
            ),
            &invoice.id,
        )
        .with_context(format!(
            "gross {} - discount {} - withholdings {}",
            invoice.gross(),
            invoice.discount(),
            invoice
                .withholdings()
                .iter()
                .map(|w| w.value)
                .sum::<Decimal>()
        )),
    )
}

/// Whether the list contains any error-severity entry.
#[must_use]
pub fn blocks_save(errors: &[ValidationError]) -> bool {
    errors.iter().any(|e| e.severity() == Severity::Error)
}

fn validate_allocations(
    invoice: &Invoice,
    kind: AllocationKind,
    options: &ValidationOptions,
    errors: &mut Vec<ValidationError>,
) {
    let entries = kind.entries(invoice);
    if entries.is_empty() && !options.require_allocations {
        return;
    }

    let target = kind.target(invoice);
    let summary = summarize(entries, target);
    if summary.balanced {
        return;
    }

    let (code, name, basis) = match kind {
        AllocationKind::Category => (ErrorCode::CategoriesUnbalanced, "Category", "gross"),
        AllocationKind::CostCenter => (ErrorCode::CostCentersUnbalanced, "Cost-center", "net"),
    };
    let message = if entries.is_empty() {
        format!("{name} allocation is empty")
    } else {
        format!("{name} allocation does not balance against {basis} {target}")
    };
    errors.push(
        ValidationError::new(code, message, &invoice.id).with_context(format!(
            "percentages {} (residual {}), values {} (residual {})",
            summary.percentage_total,
            summary.percentage_residual,
            summary.value_total,
            summary.value_residual
        )),
    );
}

fn validate_installments(
    invoice: &Invoice,
    options: &ValidationOptions,
    errors: &mut Vec<ValidationError>,
) {
    let installments = &invoice.installments;
    if installments.is_empty() {
        return;
    }

    if options.check_installment_total {
        let total = invoice.installment_total();
        if (total - invoice.net()).abs() > SETTLEMENT_EPSILON {
            errors.push(ValidationError::new(
                ErrorCode::InstallmentTotalMismatch,
                format!(
                    "Installment total {total} differs from net amount {}",
                    invoice.net()
                ),
                &invoice.id,
            ));
        }
    }

    let len = installments.len();
    for (i, installment) in installments.iter().enumerate() {
        if installment.sequence.number != i + 1 || installment.sequence.of != len {
            errors.push(
                ValidationError::new(
                    ErrorCode::StaleSequence,
                    format!(
                        "Installment {} is labeled {} but is {}/{len}",
                        installment.id,
                        installment.sequence,
                        i + 1
                    ),
                    &invoice.id,
                )
                .with_context("renumber the installment list"),
            );
        }
    }

    let ids: HashSet<_> = installments.iter().map(|i| i.id).collect();
    for installment in installments {
        if let Some(parent) = installment.split_from {
            if !ids.contains(&parent) {
                errors.push(ValidationError::new(
                    ErrorCode::DanglingRemainder,
                    format!(
                        "Installment {} was split from {parent}, which is not in the list",
                        installment.id
                    ),
                    &invoice.id,
                ));
            }
        }
    }
}

fn validate_status(invoice: &Invoice, errors: &mut Vec<ValidationError>) {
    let any_open = invoice.installments.iter().any(|i| !i.paid);

    if invoice.status == InvoiceStatus::Settled && any_open {
        errors.push(ValidationError::new(
            ErrorCode::StatusMismatch,
            format!(
                "Invoice is {} but has {} outstanding",
                invoice.status,
                invoice.outstanding()
            ),
            &invoice.id,
        ));
    } else if invoice.all_paid() && !invoice.status.is_paid() {
        errors.push(ValidationError::new(
            ErrorCode::StatusMismatch,
            format!(
                "All installments are paid but invoice is {}",
                invoice.status
            ),
            &invoice.id,
        ));
    }
}
