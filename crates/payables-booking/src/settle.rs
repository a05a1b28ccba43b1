//! Installment settlement and reversal.
//!
//! An installment is `Open` until it is settled. A settlement may be partial:
//! the settled installment keeps the applied amount and an open remainder is
//! inserted right after it, linked back through `split_from`. Reversal
//! restores the original value and removes the remainder the settlement
//! produced.
//!
//! Both operations work on a clone of the invoice and either return the new
//! invoice or reject without side effects.

use chrono::NaiveDate;
use payables_audit::{event, AuditAction, AuditContext, AuditError, AuditRecord};
use payables_core::money::{round2, SETTLEMENT_EPSILON};
use payables_core::{Installment, InstallmentId, Invoice, InvoiceStatus, Sequence};
use rust_decimal::Decimal;
use thiserror::Error;

/// Audit field name used for installment events.
const INSTALLMENTS_FIELD: &str = "installments";

/// Errors that can occur when settling an installment.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The installment index does not exist.
    #[error("no installment at index {index} (invoice has {len})")]
    NoSuchInstallment {
        /// The requested index.
        index: usize,
        /// Number of installments.
        len: usize,
    },

    /// The applied amount is not within `(0, due + ε]`.
    #[error("settlement of {applied} rejected: must be greater than 0 and at most {max} (outstanding {due})")]
    OutOfBounds {
        /// `amount - discount + interest`, rounded.
        applied: Decimal,
        /// Outstanding balance of the installment.
        due: Decimal,
        /// Largest accepted amount.
        max: Decimal,
    },

    /// The audit record could not be built.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Errors that can occur when reversing a settlement.
#[derive(Debug, Error)]
pub enum ReversalError {
    /// The installment index does not exist.
    #[error("no installment at index {index} (invoice has {len})")]
    NoSuchInstallment {
        /// The requested index.
        index: usize,
        /// Number of installments.
        len: usize,
    },

    /// The installment is open; there is nothing to reverse.
    #[error("installment {id} at index {index} is not settled")]
    NotSettled {
        /// The requested index.
        index: usize,
        /// The installment id.
        id: InstallmentId,
    },

    /// The audit record could not be built.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// A payment to apply to one installment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Amount paid.
    pub amount: Decimal,
    /// Discount granted at payment.
    pub discount: Decimal,
    /// Interest or late fee charged at payment.
    pub interest: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Settling bank. Falls back to the installment's, then the invoice's.
    pub bank: Option<String>,
}

impl Settlement {
    /// A plain payment with no discount or interest.
    #[must_use]
    pub const fn new(amount: Decimal, date: NaiveDate) -> Self {
        Self {
            amount,
            discount: Decimal::ZERO,
            interest: Decimal::ZERO,
            date,
            bank: None,
        }
    }

    /// Set the discount.
    #[must_use]
    pub const fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    /// Set the interest.
    #[must_use]
    pub const fn with_interest(mut self, interest: Decimal) -> Self {
        self.interest = interest;
        self
    }

    /// Set the settling bank.
    #[must_use]
    pub fn with_bank(mut self, bank: impl Into<String>) -> Self {
        self.bank = Some(bank.into());
        self
    }

    /// The amount actually settled: `round2(amount - discount + interest)`.
    #[must_use]
    pub fn applied(&self) -> Decimal {
        round2(self.amount - self.discount + self.interest)
    }
}

/// Result of a successful settlement.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// The updated invoice.
    pub invoice: Invoice,
    /// The settled installment.
    pub settled: InstallmentId,
    /// The open remainder created by a partial settlement.
    pub remainder: Option<InstallmentId>,
    /// The amount applied.
    pub applied: Decimal,
    /// `Settlement` record with before/after snapshots of the settled installment.
    pub audit: AuditRecord,
}

/// Result of a successful reversal.
#[derive(Debug, Clone)]
pub struct ReversalResult {
    /// The updated invoice.
    pub invoice: Invoice,
    /// The reversed installment.
    pub reversed: InstallmentId,
    /// The remainder removed from the list, if the settlement had produced one.
    pub removed_remainder: Option<Installment>,
    /// `Reversal` record with before/after snapshots of the reversed installment.
    pub audit: AuditRecord,
}

/// Reassign every sequence label to `i/n` in list order.
pub fn renumber(installments: &mut [Installment]) {
    let count = installments.len();
    for (i, installment) in installments.iter_mut().enumerate() {
        installment.sequence = Sequence::new(i + 1, count);
    }
}

/// The open remainder a partial settlement of `id` produced, if still present.
#[must_use]
pub fn remainder_of(invoice: &Invoice, id: InstallmentId) -> Option<&Installment> {
    invoice
        .installments
        .iter()
        .find(|i| i.split_from == Some(id))
}

/// Settle the installment at `index`.
///
/// The applied amount is `round2(amount - discount + interest)` and must lie
/// in `(0, due + ε]`, where `due` is the installment's outstanding balance.
/// Settling more than is due is rejected, not clamped. If the applied amount
/// leaves more than ε outstanding, an open remainder with the same due date is
/// inserted right after the settled installment. When every installment is
/// paid, the invoice becomes `Settled` on the payment date.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use payables_audit::AuditContext;
/// use payables_booking::{settle, Settlement};
/// use payables_core::{Installment, InstallmentId, Invoice};
/// use rust_decimal_macros::dec;
///
/// let due = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// let invoice = Invoice::new("NF-1", "ACME", dec!(1000.00))
///     .with_installment(Installment::new(InstallmentId(1), dec!(1000.00), due));
/// let ctx = AuditContext::new("ana", Utc.with_ymd_and_hms(2024, 3, 8, 10, 0, 0).unwrap());
///
/// let paid_on = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
/// let result = settle(&invoice, 0, &Settlement::new(dec!(700.00), paid_on), &ctx).unwrap();
///
/// let list = &result.invoice.installments;
/// assert_eq!(list.len(), 2);
/// assert_eq!(list[0].value, dec!(700.00));
/// assert_eq!(list[1].value, dec!(300.00));
/// assert_eq!(list[1].split_from, Some(InstallmentId(1)));
/// assert_eq!(list[1].sequence.to_string(), "2/2");
/// ```
pub fn settle(
    invoice: &Invoice,
    index: usize,
    settlement: &Settlement,
    ctx: &AuditContext,
) -> Result<SettlementResult, SettlementError> {
    let len = invoice.installments.len();
    let before = invoice
        .installments
        .get(index)
        .ok_or(SettlementError::NoSuchInstallment { index, len })?;

    let due = before.outstanding();
    let applied = settlement.applied();
    let max = due + SETTLEMENT_EPSILON;
    if applied <= Decimal::ZERO || applied > max {
        tracing::warn!(
            invoice = %invoice.id,
            installment = %before.id,
            %applied,
            %due,
            "settlement rejected"
        );
        return Err(SettlementError::OutOfBounds { applied, due, max });
    }

    let mut result = invoice.clone();
    let remainder_id =
        (due - applied > SETTLEMENT_EPSILON).then(|| result.next_installment_id());

    let bank = settlement
        .bank
        .clone()
        .or_else(|| before.bank.clone())
        .or_else(|| invoice.bank.clone());
    let settled = &mut result.installments[index];
    settled.value = applied;
    settled.paid = true;
    settled.payment_date = Some(settlement.date);
    settled.bank = bank;
    let after = settled.clone();

    if let Some(id) = remainder_id {
        let remainder = Installment::remainder_of(&after, id, round2(due - applied));
        result.installments.insert(index + 1, remainder);
    }
    renumber(&mut result.installments);

    if result.all_paid() {
        result.status = InvoiceStatus::Settled;
        result.settled_on = Some(settlement.date);
    }

    let audit = event(
        AuditAction::Settlement,
        INSTALLMENTS_FIELD,
        Some(before),
        Some(&after),
        ctx,
    )?;

    tracing::debug!(
        invoice = %invoice.id,
        installment = %after.id,
        %applied,
        %due,
        remainder = ?remainder_id,
        status = %result.status,
        "installment settled"
    );

    Ok(SettlementResult {
        invoice: result,
        settled: after.id,
        remainder: remainder_id,
        applied,
        audit,
    })
}

/// Reverse the settlement of the installment at `index`.
///
/// Removes the remainder the settlement produced (one level only), restores
/// the installment's original value and clears its payment data. An invoice
/// that was `Settled` goes back to `Pending`.
pub fn reverse(
    invoice: &Invoice,
    index: usize,
    ctx: &AuditContext,
) -> Result<ReversalResult, ReversalError> {
    let len = invoice.installments.len();
    let before = invoice
        .installments
        .get(index)
        .ok_or(ReversalError::NoSuchInstallment { index, len })?;
    if !before.paid {
        return Err(ReversalError::NotSettled {
            index,
            id: before.id,
        });
    }
    let id = before.id;

    let mut result = invoice.clone();
    let remainder_position = result
        .installments
        .iter()
        .enumerate()
        .find(|(pos, i)| *pos != index && i.split_from == Some(id))
        .map(|(pos, _)| pos);
    let removed_remainder = remainder_position.map(|pos| result.installments.remove(pos));

    // Removing a remainder listed before the target shifts it.
    let position = match remainder_position {
        Some(pos) if pos < index => index - 1,
        _ => index,
    };
    let reversed = &mut result.installments[position];
    reversed.value = reversed.original_value;
    reversed.paid = false;
    reversed.payment_date = None;
    reversed.bank = None;
    let after = reversed.clone();

    renumber(&mut result.installments);

    if !result.all_paid() && result.status == InvoiceStatus::Settled {
        result.status = InvoiceStatus::Pending;
        result.settled_on = None;
    }

    let audit = event(
        AuditAction::Reversal,
        INSTALLMENTS_FIELD,
        Some(before),
        Some(&after),
        ctx,
    )?;

    tracing::debug!(
        invoice = %invoice.id,
        installment = %id,
        restored = %after.value,
        removed_remainder = ?removed_remainder.as_ref().map(|r| r.id),
        status = %result.status,
        "settlement reversed"
    );

    Ok(ReversalResult {
        invoice: result,
        reversed: id,
        removed_remainder,
        audit,
    })
}
