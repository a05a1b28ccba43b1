//! 240-column fixed-width remittance layout.
//!
//! | Record | Layout |
//! |--------|--------|
//! | Header | `0`, bank code (3, zeros), company document (14, zeros), company name (30), date `DDMMYYYY`, file sequence (6, zeros) |
//! | Detail | `1`, record sequence (6, zeros), barcode (48), due date `DDMMYYYY`, amount in cents (15, zeros), supplier (30), invoice id (20) |
//! | Trailer | `9`, record count including header and trailer (6, zeros), total cents (18, zeros) |
//!
//! Text fields are left-aligned and space-padded; numeric fields are
//! right-aligned and zero-padded. Every line is filled with spaces to
//! [`LINE_WIDTH`] and ends with CRLF.

use chrono::NaiveDate;
use payables_core::money::to_cents;
use std::fmt::Write;

use crate::{RemittanceConfig, RemittanceError, RemittanceItem, RemittanceWriter};

/// Width of every record.
pub const LINE_WIDTH: usize = 240;

const CRLF: &str = "\r\n";

/// Writes the 240-column layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidthWriter;

impl RemittanceWriter for FixedWidthWriter {
    fn write(
        &self,
        items: &[RemittanceItem],
        config: &RemittanceConfig,
        date: NaiveDate,
    ) -> Result<String, RemittanceError> {
        if items.is_empty() {
            return Err(RemittanceError::EmptySelection);
        }

        let mut out = String::with_capacity((items.len() + 2) * (LINE_WIDTH + CRLF.len()));

        let mut header = String::with_capacity(LINE_WIDTH);
        header.push('0');
        header.push_str(&numeric(&digits(&config.bank_code), 3));
        header.push_str(&numeric(&digits(&config.company_document), 14));
        header.push_str(&text(&config.company_name.to_uppercase(), 30));
        header.push_str(&ddmmyyyy(date));
        header.push_str(&numeric(&config.file_sequence.to_string(), 6));
        push_record(&mut out, &header);

        let mut total_cents: i64 = 0;
        for (i, item) in items.iter().enumerate() {
            let out_of_range = || RemittanceError::AmountOutOfRange {
                invoice: item.invoice.clone(),
                amount: item.amount,
            };
            let cents = to_cents(item.amount)
                .filter(|c| *c >= 0 && c.to_string().len() <= 15)
                .ok_or_else(out_of_range)?;
            total_cents = total_cents.checked_add(cents).ok_or_else(out_of_range)?;

            let mut detail = String::with_capacity(LINE_WIDTH);
            detail.push('1');
            detail.push_str(&numeric(&(i + 1).to_string(), 6));
            detail.push_str(&text(&item.barcode, 48));
            detail.push_str(&ddmmyyyy(item.due_date));
            detail.push_str(&numeric(&cents.to_string(), 15));
            detail.push_str(&text(&item.supplier, 30));
            detail.push_str(&text(&item.invoice, 20));
            push_record(&mut out, &detail);
        }

        let mut trailer = String::with_capacity(LINE_WIDTH);
        trailer.push('9');
        trailer.push_str(&numeric(&(items.len() + 2).to_string(), 6));
        trailer.push_str(&numeric(&total_cents.to_string(), 18));
        push_record(&mut out, &trailer);

        tracing::debug!(
            records = items.len() + 2,
            total_cents,
            sequence = config.file_sequence,
            "remittance encoded"
        );
        Ok(out)
    }
}

fn push_record(out: &mut String, record: &str) {
    write!(out, "{record:<LINE_WIDTH$}{CRLF}").unwrap();
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Left-aligned, space-padded, truncated, non-ASCII folded to `?`.
fn text(s: &str, width: usize) -> String {
    let folded: String = s
        .trim()
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .take(width)
        .collect();
    format!("{folded:<width$}")
}

/// Right-aligned, zero-padded. Longer input keeps its rightmost digits.
fn numeric(s: &str, width: usize) -> String {
    let start = s.len().saturating_sub(width);
    format!("{:0>width$}", &s[start..])
}

fn ddmmyyyy(date: NaiveDate) -> String {
    date.format("%d%m%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_text_field() {
        assert_eq!(text("abc", 5), "abc  ");
        assert_eq!(text("abcdef", 4), "abcd");
        assert_eq!(text("Açaí Ltda", 9), "A?a? Ltda");
    }

    #[test]
    fn test_numeric_field() {
        assert_eq!(numeric("341", 3), "341");
        assert_eq!(numeric("41", 3), "041");
        assert_eq!(numeric("1234", 3), "234");
        assert_eq!(digits("12.345.678/0001-90"), "12345678000190");
    }

    #[test]
    fn test_negative_amount_rejected() {
        let item = RemittanceItem {
            invoice: "NF-1".to_string(),
            supplier: "ACME".to_string(),
            bank: "341".to_string(),
            barcode: "1".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            amount: dec!(-1.00),
        };
        let config = RemittanceConfig::default();
        assert_eq!(
            FixedWidthWriter.write(&[item], &config, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            Err(RemittanceError::AmountOutOfRange {
                invoice: "NF-1".to_string(),
                amount: dec!(-1.00),
            })
        );
    }
}
