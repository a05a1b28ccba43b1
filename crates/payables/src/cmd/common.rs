//! Argument parsing and file handling shared by the commands.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use payables_audit::{AuditContext, AuditRecord};
use payables_core::{Decimal, Invoice};
use serde::Serialize;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Parse an amount in either decimal convention.
pub fn parse_decimal(s: &str) -> Result<Decimal, String> {
    payables_loader::parse_amount(s).ok_or_else(|| format!("invalid amount: {s}"))
}

/// Parse a date as `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_day(s: &str) -> Result<NaiveDate, String> {
    payables_loader::parse_date(s).ok_or_else(|| format!("invalid date: {s}"))
}

/// Parse an RFC 3339 timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {s}: {e}"))
}

/// Install a DEBUG-level subscriber when `verbose` is set, otherwise one
/// driven by `RUST_LOG` if that is present.
pub fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Audit context for `actor`, at `at` or now.
pub fn audit_context(actor: &str, at: Option<DateTime<Utc>>) -> AuditContext {
    AuditContext::new(actor, at.unwrap_or_else(Utc::now))
}

/// The given date, or today.
pub fn day_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// Load every invoice in `path`.
pub fn load(path: &Path) -> Result<Vec<Invoice>> {
    payables_loader::load_file(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Write invoices back to `path`.
pub fn save(path: &Path, invoices: &[Invoice]) -> Result<()> {
    payables_loader::save_file(path, invoices)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Position of the invoice to operate on.
///
/// Without an id, the file must hold exactly one invoice.
pub fn pick(invoices: &[Invoice], id: Option<&str>, path: &Path) -> Result<usize> {
    match id {
        Some(id) => invoices
            .iter()
            .position(|i| i.id == id)
            .with_context(|| format!("invoice {id} not found in {}", path.display())),
        None if invoices.len() == 1 => Ok(0),
        None => bail!(
            "{} holds {} invoices; choose one with --invoice",
            path.display(),
            invoices.len()
        ),
    }
}

/// Convert a one-based installment number into a list index.
pub fn installment_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .context("installment numbers start at 1")
}

/// What a mutating command prints: the updated invoice and its audit trail.
#[derive(Debug, Serialize)]
pub struct ChangeOutput<'a> {
    /// The invoice after the change.
    pub invoice: &'a Invoice,
    /// Records describing the change.
    pub audit: &'a [AuditRecord],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parsers() {
        assert_eq!(parse_decimal("1.234,56").unwrap().to_string(), "1234.56");
        assert!(parse_decimal("abc").is_err());
        assert_eq!(
            parse_day("10/03/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        let at = parse_timestamp("2024-03-10T09:00:00-03:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2024-03-10T12:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_pick() {
        let path = PathBuf::from("invoices.json");
        let one = vec![Invoice::new("NF-1", "A", Decimal::ONE)];
        assert_eq!(pick(&one, None, &path).unwrap(), 0);

        let two = vec![
            Invoice::new("NF-1", "A", Decimal::ONE),
            Invoice::new("NF-2", "B", Decimal::ONE),
        ];
        assert_eq!(pick(&two, Some("NF-2"), &path).unwrap(), 1);
        assert!(pick(&two, None, &path).is_err());
        assert!(pick(&two, Some("NF-3"), &path).is_err());
    }

    #[test]
    fn test_installment_index() {
        assert_eq!(installment_index(1).unwrap(), 0);
        assert!(installment_index(0).is_err());
    }
}
