//! The accounts-payable invoice record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::reconcile::compute_net;
use crate::{AllocationEntry, Installment, InstallmentId, Withholding};

/// Lifecycle status of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Expected but not yet confirmed.
    Forecast,
    /// Confirmed and awaiting payment.
    #[default]
    Pending,
    /// Payment scheduled with the bank.
    Scheduled,
    /// Every installment paid.
    Settled,
    /// Settlement matched against the bank statement.
    Reconciled,
}

impl InvoiceStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Forecast,
        Self::Pending,
        Self::Scheduled,
        Self::Settled,
        Self::Reconciled,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forecast => "Forecast",
            Self::Pending => "Pending",
            Self::Scheduled => "Scheduled",
            Self::Settled => "Settled",
            Self::Reconciled => "Reconciled",
        }
    }

    /// Whether the status implies every installment has been paid.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Settled | Self::Reconciled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown invoice status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forecast" | "previsto" | "previsao" | "previsão" => Ok(Self::Forecast),
            "pending" | "pendente" | "aberto" => Ok(Self::Pending),
            "scheduled" | "agendado" => Ok(Self::Scheduled),
            "settled" | "paid" | "pago" | "quitado" => Ok(Self::Settled),
            "reconciled" | "conciliado" => Ok(Self::Reconciled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// An accounts-payable record: what is owed to one supplier and how it is
/// decomposed, allocated and paid.
///
/// The net amount is private and derived: every mutator that touches gross,
/// discount or withholdings recomputes it.
///
/// # Example
///
/// ```
/// use payables_core::{Invoice, Withholding};
/// use rust_decimal_macros::dec;
///
/// let mut invoice = Invoice::new("NF-1001", "ACME Ltda", dec!(1000.00));
/// invoice.set_discount(dec!(10.00));
/// invoice.push_withholding(Withholding::computed("IRRF", dec!(1000.00), dec!(1.5)));
/// assert_eq!(invoice.net(), dec!(975.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InvoiceRecord")]
pub struct Invoice {
    /// Document identifier.
    pub id: String,
    /// Supplier reference.
    pub supplier: String,
    gross: Decimal,
    discount: Decimal,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// Default settling bank.
    pub bank: Option<String>,
    /// Payment barcode or bank reference.
    pub barcode: Option<String>,
    /// Date the last installment was settled.
    pub settled_on: Option<NaiveDate>,
    withholdings: Vec<Withholding>,
    /// Expense categories, allocated against the gross amount.
    pub categories: Vec<AllocationEntry>,
    /// Cost centers (rateio), allocated against the net amount.
    pub cost_centers: Vec<AllocationEntry>,
    /// Payment installments, in display order.
    pub installments: Vec<Installment>,
    net: Decimal,
}

/// Serialized shape of an [`Invoice`]. Any `net` in the input is ignored.
#[derive(Deserialize)]
struct InvoiceRecord {
    id: String,
    supplier: String,
    gross: Decimal,
    discount: Decimal,
    status: InvoiceStatus,
    bank: Option<String>,
    barcode: Option<String>,
    settled_on: Option<NaiveDate>,
    withholdings: Vec<Withholding>,
    categories: Vec<AllocationEntry>,
    cost_centers: Vec<AllocationEntry>,
    installments: Vec<Installment>,
}

impl From<InvoiceRecord> for Invoice {
    fn from(record: InvoiceRecord) -> Self {
        let mut invoice = Self {
            id: record.id,
            supplier: record.supplier,
            gross: record.gross,
            discount: record.discount,
            status: record.status,
            bank: record.bank,
            barcode: record.barcode,
            settled_on: record.settled_on,
            withholdings: record.withholdings,
            categories: record.categories,
            cost_centers: record.cost_centers,
            installments: record.installments,
            net: Decimal::ZERO,
        };
        invoice.refresh_net();
        invoice
    }
}

impl Invoice {
    /// Create a pending invoice with no discount or withholdings.
    #[must_use]
    pub fn new(id: impl Into<String>, supplier: impl Into<String>, gross: Decimal) -> Self {
        Self {
            id: id.into(),
            supplier: supplier.into(),
            gross,
            discount: Decimal::ZERO,
            status: InvoiceStatus::default(),
            bank: None,
            barcode: None,
            settled_on: None,
            withholdings: Vec::new(),
            categories: Vec::new(),
            cost_centers: Vec::new(),
            installments: Vec::new(),
            net: compute_net(gross, Decimal::ZERO, &[]),
        }
    }

    /// Set the default settling bank.
    #[must_use]
    pub fn with_bank(mut self, bank: impl Into<String>) -> Self {
        self.bank = Some(bank.into());
        self
    }

    /// Set the payment barcode.
    #[must_use]
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    /// Append an installment.
    #[must_use]
    pub fn with_installment(mut self, installment: Installment) -> Self {
        self.installments.push(installment);
        self
    }

    /// Gross amount.
    #[must_use]
    pub const fn gross(&self) -> Decimal {
        self.gross
    }

    /// Discount amount.
    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    /// Derived net amount.
    #[must_use]
    pub const fn net(&self) -> Decimal {
        self.net
    }

    /// Withholdings, read-only. Use the `*_withholding*` mutators to edit.
    #[must_use]
    pub fn withholdings(&self) -> &[Withholding] {
        &self.withholdings
    }

    /// Set the gross amount.
    pub fn set_gross(&mut self, gross: Decimal) {
        self.gross = gross;
        self.refresh_net();
    }

    /// Set the discount amount.
    pub fn set_discount(&mut self, discount: Decimal) {
        self.discount = discount;
        self.refresh_net();
    }

    /// Append a withholding.
    pub fn push_withholding(&mut self, withholding: Withholding) {
        self.withholdings.push(withholding);
        self.refresh_net();
    }

    /// Remove the withholding at `index`, returning it.
    pub fn remove_withholding(&mut self, index: usize) -> Option<Withholding> {
        if index >= self.withholdings.len() {
            return None;
        }
        let removed = self.withholdings.remove(index);
        self.refresh_net();
        Some(removed)
    }

    /// Set the rate of the withholding at `index`. Returns `false` if out of range.
    pub fn set_withholding_rate(&mut self, index: usize, rate: Option<Decimal>) -> bool {
        self.edit_withholding(index, |w| w.set_rate(rate))
    }

    /// Set the base of the withholding at `index`. Returns `false` if out of range.
    pub fn set_withholding_base(&mut self, index: usize, base: Option<Decimal>) -> bool {
        self.edit_withholding(index, |w| w.set_base(base))
    }

    /// Enter the value of the withholding at `index`. Returns `false` if out of range.
    pub fn set_withholding_value(&mut self, index: usize, value: Decimal) -> bool {
        self.edit_withholding(index, |w| w.set_value(value))
    }

    fn edit_withholding(&mut self, index: usize, edit: impl FnOnce(&mut Withholding)) -> bool {
        let Some(withholding) = self.withholdings.get_mut(index) else {
            return false;
        };
        edit(withholding);
        self.refresh_net();
        true
    }

    /// Recompute the net amount from gross, discount and withholdings.
    pub fn refresh_net(&mut self) {
        self.net = compute_net(self.gross, self.discount, &self.withholdings);
    }

    /// Whether the installment list is non-empty and fully paid.
    #[must_use]
    pub fn all_paid(&self) -> bool {
        !self.installments.is_empty() && self.installments.iter().all(|i| i.paid)
    }

    /// Sum of the values of all unpaid installments.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.installments.iter().map(Installment::outstanding).sum()
    }

    /// Sum of the values of all installments, paid or not.
    #[must_use]
    pub fn installment_total(&self) -> Decimal {
        self.installments.iter().map(|i| i.value).sum()
    }

    /// Find the position of an installment by id.
    #[must_use]
    pub fn position_of(&self, id: InstallmentId) -> Option<usize> {
        self.installments.iter().position(|i| i.id == id)
    }

    /// An id not used by any installment of this invoice.
    #[must_use]
    pub fn next_installment_id(&self) -> InstallmentId {
        let max = self.installments.iter().map(|i| i.id.0).max().unwrap_or(0);
        InstallmentId(max + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_deserialized_net_is_derived() {
        let mut invoice = Invoice::new("NF-1", "ACME", dec!(100.00));
        invoice.push_withholding(Withholding::fixed("ISS", dec!(5.00)));
        let mut json: serde_json::Value = serde_json::to_value(&invoice).unwrap();
        json["net"] = serde_json::Value::String("55.55".to_string());

        let loaded: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(
            loaded.net(),
            compute_net(loaded.gross(), loaded.discount(), loaded.withholdings())
        );
        assert_eq!(loaded.net(), dec!(95.00));
        assert_eq!(loaded, invoice);
    }

    #[test]
    fn test_new_net_equals_gross() {
        let invoice = Invoice::new("NF-1", "ACME", dec!(1500.00));
        assert_eq!(invoice.net(), dec!(1500.00));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }

    #[test]
    fn test_net_follows_every_edit() {
        let mut invoice = Invoice::new("NF-1", "ACME", dec!(1000.00));
        invoice.push_withholding(Withholding::computed("IRRF", dec!(1000.00), dec!(1.5)));
        assert_eq!(invoice.net(), dec!(985.00));

        invoice.set_gross(dec!(1200.00));
        assert_eq!(invoice.net(), dec!(1185.00));

        invoice.set_discount(dec!(100.00));
        assert_eq!(invoice.net(), dec!(1085.00));

        assert!(invoice.set_withholding_rate(0, Some(dec!(3))));
        assert_eq!(invoice.net(), dec!(1070.00));

        assert!(invoice.set_withholding_base(0, Some(dec!(1200.00))));
        assert_eq!(invoice.net(), dec!(1064.00));

        assert!(invoice.set_withholding_value(0, dec!(0)));
        assert_eq!(invoice.net(), dec!(1100.00));

        assert!(invoice.remove_withholding(0).is_some());
        assert_eq!(invoice.net(), dec!(1100.00));
    }

    #[test]
    fn test_withholding_edit_out_of_range() {
        let mut invoice = Invoice::new("NF-1", "ACME", dec!(1000.00));
        assert!(!invoice.set_withholding_rate(3, Some(dec!(1))));
        assert!(invoice.remove_withholding(0).is_none());
    }

    #[test]
    fn test_all_paid_requires_installments() {
        let mut invoice = Invoice::new("NF-1", "ACME", dec!(100.00));
        assert!(!invoice.all_paid());

        invoice
            .installments
            .push(Installment::new(InstallmentId(1), dec!(100.00), date(2024, 1, 10)));
        assert!(!invoice.all_paid());

        invoice.installments[0].paid = true;
        assert!(invoice.all_paid());
    }

    #[test]
    fn test_outstanding_and_next_id() {
        let mut paid = Installment::new(InstallmentId(4), dec!(60.00), date(2024, 1, 10));
        paid.paid = true;
        let invoice = Invoice::new("NF-1", "ACME", dec!(100.00))
            .with_installment(paid)
            .with_installment(Installment::new(
                InstallmentId(2),
                dec!(40.00),
                date(2024, 2, 10),
            ));

        assert_eq!(invoice.outstanding(), dec!(40.00));
        assert_eq!(invoice.installment_total(), dec!(100.00));
        assert_eq!(invoice.next_installment_id(), InstallmentId(5));
        assert_eq!(invoice.position_of(InstallmentId(2)), Some(1));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Settled".parse(), Ok(InvoiceStatus::Settled));
        assert_eq!(" quitado ".parse(), Ok(InvoiceStatus::Settled));
        assert_eq!("PENDENTE".parse(), Ok(InvoiceStatus::Pending));
        assert_eq!("conciliado".parse(), Ok(InvoiceStatus::Reconciled));
        assert_eq!(
            "void".parse::<InvoiceStatus>(),
            Err(UnknownStatus("void".to_string()))
        );
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse(), Ok(status));
        }
    }
}
