//! Plain-text rendering of invoices.
//!
//! Produces an aligned summary with amounts right-aligned at a configurable
//! column, used by command-line output.

use crate::{AllocationEntry, Installment, Invoice, Withholding};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Formatter configuration.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Column amounts end at (default: 60).
    pub amount_column: usize,
    /// Indentation for detail lines.
    pub indent: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            amount_column: 60,
            indent: "  ".to_string(),
        }
    }
}

impl FormatConfig {
    /// Create a new config with the specified amount column.
    #[must_use]
    pub fn with_column(column: usize) -> Self {
        Self {
            amount_column: column,
            ..Default::default()
        }
    }

    /// Create a new config with both column and indent settings.
    #[must_use]
    pub fn new(column: usize, indent_width: usize) -> Self {
        Self {
            amount_column: column,
            indent: " ".repeat(indent_width),
        }
    }
}

/// Format an invoice summary.
pub fn format_invoice(invoice: &Invoice, config: &FormatConfig) -> String {
    let mut out = String::new();

    write!(
        out,
        "{} {} \"{}\"",
        invoice.id,
        invoice.status,
        escape_string(&invoice.supplier)
    )
    .unwrap();
    if let Some(bank) = &invoice.bank {
        write!(out, " bank:{bank}").unwrap();
    }
    if let Some(date) = invoice.settled_on {
        write!(out, " settled:{date}").unwrap();
    }
    out.push('\n');

    push_line(&mut out, config, "gross", invoice.gross());
    if !invoice.discount().is_zero() {
        push_line(&mut out, config, "discount", -invoice.discount());
    }
    for withholding in invoice.withholdings() {
        push_line(
            &mut out,
            config,
            &format_withholding(withholding),
            -withholding.value,
        );
    }
    push_line(&mut out, config, "net", invoice.net());

    for entry in &invoice.categories {
        push_allocation(&mut out, config, "category", entry);
    }
    for entry in &invoice.cost_centers {
        push_allocation(&mut out, config, "cost-center", entry);
    }
    for installment in &invoice.installments {
        push_line(
            &mut out,
            config,
            &format_installment(installment),
            installment.value,
        );
    }

    out
}

fn push_line(out: &mut String, config: &FormatConfig, label: &str, amount: Decimal) {
    let mut line = String::new();
    line.push_str(&config.indent);
    line.push_str(label);

    let amount_str = amount.to_string();
    let target_col = config.amount_column.saturating_sub(amount_str.len());
    if line.len() < target_col {
        let padding = target_col - line.len();
        line.push_str(&" ".repeat(padding));
    } else {
        line.push_str("  "); // Minimum 2 spaces
    }
    line.push_str(&amount_str);

    out.push_str(&line);
    out.push('\n');
}

fn push_allocation(out: &mut String, config: &FormatConfig, kind: &str, entry: &AllocationEntry) {
    let mut label = format!("{kind} \"{}\"", escape_string(&entry.label));
    if let Some(pct) = entry.percentage {
        write!(label, " {pct}%").unwrap();
    }
    match entry.value {
        Some(value) => push_line(out, config, &label, value),
        None => {
            writeln!(out, "{}{label}", config.indent).unwrap();
        }
    }
}

fn format_withholding(withholding: &Withholding) -> String {
    match (withholding.base, withholding.rate) {
        (Some(base), Some(rate)) => {
            format!("withholding {} {rate}% of {base}", withholding.kind)
        }
        _ => format!("withholding {}", withholding.kind),
    }
}

fn format_installment(installment: &Installment) -> String {
    let mut out = format!(
        "installment {} {} due {}",
        installment.sequence, installment.id, installment.due_date
    );
    if installment.paid {
        out.push_str(" paid");
        if let Some(date) = installment.payment_date {
            write!(out, " {date}").unwrap();
        }
        if let Some(bank) = &installment.bank {
            write!(out, " via {bank}").unwrap();
        }
    }
    if let Some(parent) = installment.split_from {
        write!(out, " split from {parent}").unwrap();
    }
    out
}

/// Escape a string for quoted output.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
