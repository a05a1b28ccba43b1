//! Integration tests for installment settlement, reversal and allocation
//! against whole invoices.

use chrono::{NaiveDate, TimeZone, Utc};
use payables_audit::{AuditAction, AuditContext};
use payables_booking::{
    apply_edit, reverse, settle, summarize, AllocationEdit, AllocationKind, Settlement,
};
use payables_core::{
    AllocationEntry, Installment, InstallmentId, Invoice, InvoiceStatus, Withholding,
};
use rust_decimal_macros::dec;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn ctx() -> AuditContext {
    AuditContext::new("joao", Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap())
}

/// A 1000.00 invoice paid in a single installment.
fn single() -> Invoice {
    Invoice::new("NF-1001", "ACME Ltda", dec!(1000.00))
        .with_bank("Itau")
        .with_installment(Installment::new(InstallmentId(1), dec!(1000.00), date(2024, 5, 10)))
}

/// A 900.00 invoice paid in three monthly installments.
fn three_way() -> Invoice {
    let mut invoice = Invoice::new("NF-2002", "Papelaria Central", dec!(900.00));
    for (i, month) in [5u32, 6, 7].into_iter().enumerate() {
        invoice = invoice.with_installment(Installment::new(
            InstallmentId(i as u64 + 1),
            dec!(300.00),
            date(2024, month, 10),
        ));
    }
    payables_booking::renumber(&mut invoice.installments);
    invoice
}

fn labels(invoice: &Invoice) -> Vec<String> {
    invoice
        .installments
        .iter()
        .map(|i| i.sequence.to_string())
        .collect()
}

#[test]
fn test_partial_settlement_of_single_installment() {
    let result = settle(&single(), 0, &Settlement::new(dec!(700.00), date(2024, 5, 2)), &ctx())
        .unwrap();
    let invoice = &result.invoice;

    assert_eq!(labels(invoice), vec!["1/2", "2/2"]);
    assert_eq!(invoice.installments[0].value, dec!(700.00));
    assert!(invoice.installments[0].paid);
    assert_eq!(invoice.installments[1].value, dec!(300.00));
    assert!(!invoice.installments[1].paid);
    assert_eq!(invoice.outstanding(), dec!(300.00));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(result.applied, dec!(700.00));
}

#[test]
fn test_full_settlement_marks_invoice_settled() {
    let result = settle(&single(), 0, &Settlement::new(dec!(1000.00), date(2024, 5, 2)), &ctx())
        .unwrap();
    assert_eq!(result.invoice.installments.len(), 1);
    assert_eq!(result.remainder, None);
    assert_eq!(result.invoice.status, InvoiceStatus::Settled);
    assert_eq!(result.invoice.settled_on, Some(date(2024, 5, 2)));
}

#[test]
fn test_over_settlement_rejected_without_change() {
    let invoice = single();
    let snapshot = invoice.clone();
    let err = settle(&invoice, 0, &Settlement::new(dec!(1200.00), date(2024, 5, 2)), &ctx())
        .unwrap_err();
    assert!(err.to_string().contains("1200.00"));
    assert_eq!(invoice, snapshot);
}

#[test]
fn test_reversal_restores_state() {
    let original = three_way();
    for amount in [dec!(300.00), dec!(120.00)] {
        let settled = settle(&original, 1, &Settlement::new(amount, date(2024, 6, 1)), &ctx())
            .unwrap()
            .invoice;
        let reversed = reverse(&settled, 1, &ctx()).unwrap();
        assert_eq!(reversed.invoice, original);
        assert_eq!(reversed.audit.action(), AuditAction::Reversal);
    }
}

#[test]
fn test_remainder_inserted_after_settled_installment() {
    let result = settle(&three_way(), 1, &Settlement::new(dec!(100.00), date(2024, 6, 1)), &ctx())
        .unwrap();
    let ids: Vec<u64> = result.invoice.installments.iter().map(|i| i.id.0).collect();
    assert_eq!(ids, vec![1, 2, 4, 3]);
    assert_eq!(labels(&result.invoice), vec!["1/4", "2/4", "3/4", "4/4"]);
    assert_eq!(result.invoice.installments[2].due_date, date(2024, 6, 10));
    assert_eq!(result.invoice.installment_total(), dec!(900.00));
}

#[test]
fn test_paying_every_installment_settles_invoice() {
    let mut invoice = three_way();
    for (index, day) in [(0, 10u32), (1, 11), (2, 12)] {
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        invoice = settle(
            &invoice,
            index,
            &Settlement::new(dec!(300.00), date(2024, 7, day)),
            &ctx(),
        )
        .unwrap()
        .invoice;
    }
    assert_eq!(invoice.status, InvoiceStatus::Settled);
    assert_eq!(invoice.settled_on, Some(date(2024, 7, 12)));

    let reopened = reverse(&invoice, 2, &ctx()).unwrap().invoice;
    assert_eq!(reopened.status, InvoiceStatus::Pending);
    assert_eq!(reopened.settled_on, None);
    assert_eq!(reopened.outstanding(), dec!(300.00));
}

#[test]
fn test_chain_of_partial_settlements() {
    let mut invoice = single();
    for (step, amount) in [dec!(100.00), dec!(250.00), dec!(400.00)].into_iter().enumerate() {
        invoice = settle(
            &invoice,
            step,
            &Settlement::new(amount, date(2024, 5, 2 + step as u32)),
            &ctx(),
        )
        .unwrap()
        .invoice;
    }
    let values: Vec<_> = invoice.installments.iter().map(|i| i.value).collect();
    assert_eq!(values, vec![dec!(100.00), dec!(250.00), dec!(400.00), dec!(250.00)]);
    assert_eq!(labels(&invoice), vec!["1/4", "2/4", "3/4", "4/4"]);
    assert!(invoice.installments[3].split_from.is_some());
    assert_eq!(invoice.installment_total(), dec!(1000.00));
}

#[test]
fn test_settlement_audit_snapshots() {
    let result = settle(&single(), 0, &Settlement::new(dec!(700.00), date(2024, 5, 2)), &ctx())
        .unwrap();
    let audit = &result.audit;
    assert_eq!(audit.action(), AuditAction::Settlement);
    assert_eq!(audit.actor(), "joao");
    assert_eq!(audit.field(), Some("installments"));
    assert!(audit.previous().unwrap().contains("\"paid\":false"));
    assert!(audit.new_value().unwrap().contains("\"paid\":true"));
}

#[test]
fn test_cost_centers_follow_net() {
    let mut invoice = single();
    invoice.push_withholding(Withholding::computed("IRRF", dec!(1000.00), dec!(1.5)));
    invoice.cost_centers = vec![AllocationEntry::new("Ops"), AllocationEntry::new("Sales")];
    assert_eq!(invoice.net(), dec!(985.00));

    let updated = apply_edit(
        &invoice,
        AllocationKind::CostCenter,
        0,
        AllocationEdit::Value(dec!(492.50)),
    )
    .unwrap();
    assert_eq!(updated.cost_centers[0].percentage, Some(dec!(50.00)));
    assert_eq!(updated.cost_centers[1].value, Some(dec!(492.50)));

    let summary = summarize(&updated.cost_centers, AllocationKind::CostCenter.target(&updated));
    assert!(summary.balanced);
    assert_eq!(summary.value_residual, dec!(0.00));
}
