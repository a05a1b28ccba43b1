//! Loose payload shapes and their coercion into typed records.
//!
//! Amounts arrive as JSON numbers or as strings in either decimal
//! convention (`1234.56`, `1.234,56`, `R$ 1.234,56`). Dates arrive as
//! `YYYY-MM-DD` or `DD/MM/YYYY`. Everything is coerced once here; nothing
//! downstream sees a raw value.

use chrono::NaiveDate;
use payables_core::{
    AllocationEntry, Installment, InstallmentId, Invoice, InvoiceStatus, Sequence, Withholding,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;

use crate::LoadError;

/// An amount as it appears in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A string, in either decimal convention.
    Text(String),
    /// A JSON number.
    Number(Decimal),
}

/// An invoice as it appears in a payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInvoice {
    /// Document identifier.
    pub id: String,
    /// Supplier reference.
    pub supplier: String,
    /// Gross amount.
    #[serde(alias = "gross_amount")]
    pub gross: RawAmount,
    /// Discount amount.
    #[serde(default)]
    pub discount: Option<RawAmount>,
    /// Net amount as declared by the sender, checked against the derived one.
    #[serde(default, alias = "net_amount")]
    pub net: Option<RawAmount>,
    /// Status, free text.
    #[serde(default)]
    pub status: Option<String>,
    /// Default settling bank.
    #[serde(default)]
    pub bank: Option<String>,
    /// Payment barcode.
    #[serde(default)]
    pub barcode: Option<String>,
    /// Settlement date.
    #[serde(default)]
    pub settled_on: Option<String>,
    /// Withholdings.
    #[serde(default)]
    pub withholdings: Vec<RawWithholding>,
    /// Expense categories.
    #[serde(default)]
    pub categories: Vec<RawAllocation>,
    /// Cost centers.
    #[serde(default)]
    pub cost_centers: Vec<RawAllocation>,
    /// Installments.
    #[serde(default)]
    pub installments: Vec<RawInstallment>,
}

/// A withholding as it appears in a payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWithholding {
    /// Tax type tag.
    pub kind: String,
    /// Calculation base.
    #[serde(default)]
    pub base: Option<RawAmount>,
    /// Rate in percent.
    #[serde(default)]
    pub rate: Option<RawAmount>,
    /// Retained amount. Derived from base and rate when absent.
    #[serde(default)]
    pub value: Option<RawAmount>,
}

/// An allocation entry as it appears in a payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAllocation {
    /// Category or cost-center name.
    pub label: String,
    /// Share in percent.
    #[serde(default)]
    pub percentage: Option<RawAmount>,
    /// Share as an absolute amount.
    #[serde(default)]
    pub value: Option<RawAmount>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

/// An installment as it appears in a payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstallment {
    /// Stable id. Assigned on load when absent.
    #[serde(default)]
    pub id: Option<u64>,
    /// Current value.
    pub value: RawAmount,
    /// Value at creation. Defaults to `value`.
    #[serde(default)]
    pub original_value: Option<RawAmount>,
    /// Due date.
    pub due_date: String,
    /// Whether the installment has been settled.
    #[serde(default)]
    pub paid: bool,
    /// Settlement date.
    #[serde(default)]
    pub payment_date: Option<String>,
    /// Settling bank.
    #[serde(default)]
    pub bank: Option<String>,
    /// Id of the installment this one was split from.
    #[serde(default)]
    pub split_from: Option<u64>,
}

/// Parse a money string in either decimal convention.
///
/// Currency markers and whitespace are ignored; parentheses mean negative.
/// When both `.` and `,` appear, the one that comes last is the decimal
/// separator. A lone `,` is a decimal comma; repeated `.` are thousands
/// separators.
#[must_use]
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (is_negative, s) = match s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };

    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        (None, Some(_)) => kept.replace(',', "."),
        (Some(_), None) if kept.matches('.').count() > 1 => kept.replace('.', ""),
        _ => kept,
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if is_negative { -value } else { value })
}

/// Parse a date as `YYYY-MM-DD` or `DD/MM/YYYY`.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

/// Field-path aware coercion for one invoice.
struct Coercer<'a> {
    invoice: &'a str,
}

impl Coercer<'_> {
    fn amount(&self, field: &str, raw: &RawAmount) -> Result<Decimal, LoadError> {
        match raw {
            RawAmount::Number(value) => Ok(*value),
            RawAmount::Text(text) => parse_amount(text).ok_or_else(|| LoadError::InvalidAmount {
                invoice: self.invoice.to_string(),
                field: field.to_string(),
                value: text.clone(),
            }),
        }
    }

    fn optional_amount(
        &self,
        field: &str,
        raw: Option<&RawAmount>,
    ) -> Result<Option<Decimal>, LoadError> {
        raw.map(|r| self.amount(field, r)).transpose()
    }

    fn date(&self, field: &str, raw: &str) -> Result<NaiveDate, LoadError> {
        parse_date(raw).ok_or_else(|| LoadError::InvalidDate {
            invoice: self.invoice.to_string(),
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    fn optional_date(&self, field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, LoadError> {
        raw.map(|r| self.date(field, r)).transpose()
    }

    fn withholding(&self, i: usize, raw: &RawWithholding) -> Result<Withholding, LoadError> {
        let base = self.optional_amount(&format!("withholdings[{i}].base"), raw.base.as_ref())?;
        let rate = self.optional_amount(&format!("withholdings[{i}].rate"), raw.rate.as_ref())?;
        let value = self.optional_amount(&format!("withholdings[{i}].value"), raw.value.as_ref())?;

        match (value, base, rate) {
            (Some(value), _, _) => {
                let mut withholding = Withholding::fixed(&raw.kind, value);
                withholding.base = base;
                withholding.rate = rate;
                Ok(withholding)
            }
            (None, Some(base), Some(rate)) => Ok(Withholding::computed(&raw.kind, base, rate)),
            (None, _, _) => Err(LoadError::MissingField {
                invoice: self.invoice.to_string(),
                field: format!("withholdings[{i}].value"),
            }),
        }
    }

    fn allocation(
        &self,
        list: &str,
        i: usize,
        raw: &RawAllocation,
    ) -> Result<AllocationEntry, LoadError> {
        Ok(AllocationEntry {
            label: raw.label.clone(),
            percentage: self.optional_amount(
                &format!("{list}[{i}].percentage"),
                raw.percentage.as_ref(),
            )?,
            value: self.optional_amount(&format!("{list}[{i}].value"), raw.value.as_ref())?,
            note: raw.note.clone(),
        })
    }

    fn installments(&self, raw: &[RawInstallment]) -> Result<Vec<Installment>, LoadError> {
        let mut next_id = raw.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        let mut installments = Vec::with_capacity(raw.len());
        let mut seen = HashSet::with_capacity(raw.len());

        for (i, r) in raw.iter().enumerate() {
            let id = r.id.unwrap_or_else(|| {
                let id = next_id;
                next_id += 1;
                id
            });
            if !seen.insert(id) {
                return Err(LoadError::DuplicateInstallmentId {
                    invoice: self.invoice.to_string(),
                    id: InstallmentId(id),
                });
            }
            let value = self.amount(&format!("installments[{i}].value"), &r.value)?;
            let original_value = self
                .optional_amount(
                    &format!("installments[{i}].original_value"),
                    r.original_value.as_ref(),
                )?
                .unwrap_or(value);

            installments.push(Installment {
                id: InstallmentId(id),
                sequence: Sequence::default(),
                value,
                original_value,
                due_date: self.date(&format!("installments[{i}].due_date"), &r.due_date)?,
                paid: r.paid,
                payment_date: self.optional_date(
                    &format!("installments[{i}].payment_date"),
                    r.payment_date.as_deref(),
                )?,
                bank: r.bank.clone(),
                split_from: r.split_from.map(InstallmentId),
            });
        }

        payables_booking::renumber(&mut installments);
        Ok(installments)
    }
}

impl RawInvoice {
    /// Coerce into a typed invoice.
    ///
    /// The net amount is derived; a declared net that disagrees with it is
    /// rejected.
    pub fn into_invoice(self) -> Result<Invoice, LoadError> {
        let c = Coercer { invoice: &self.id };

        let gross = c.amount("gross", &self.gross)?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => InvoiceStatus::default(),
            Some(text) => {
                InvoiceStatus::from_str(text).map_err(|_| LoadError::UnknownStatus {
                    invoice: self.id.clone(),
                    status: text.to_string(),
                })?
            }
        };

        let mut invoice = Invoice::new(self.id.clone(), self.supplier.clone(), gross)
            .with_status(status);
        if let Some(discount) = c.optional_amount("discount", self.discount.as_ref())? {
            invoice.set_discount(discount);
        }
        for (i, raw) in self.withholdings.iter().enumerate() {
            invoice.push_withholding(c.withholding(i, raw)?);
        }

        invoice.bank = self.bank.clone();
        invoice.barcode = self.barcode.clone();
        invoice.settled_on = c.optional_date("settled_on", self.settled_on.as_deref())?;
        invoice.categories = self
            .categories
            .iter()
            .enumerate()
            .map(|(i, r)| c.allocation("categories", i, r))
            .collect::<Result<_, _>>()?;
        invoice.cost_centers = self
            .cost_centers
            .iter()
            .enumerate()
            .map(|(i, r)| c.allocation("cost_centers", i, r))
            .collect::<Result<_, _>>()?;
        invoice.installments = c.installments(&self.installments)?;

        if let Some(declared) = c.optional_amount("net", self.net.as_ref())? {
            if !payables_core::net_matches(declared, invoice.net()) {
                return Err(LoadError::InconsistentNet {
                    invoice: self.id,
                    declared,
                    derived: invoice.net(),
                });
            }
        }

        Ok(invoice)
    }
}
