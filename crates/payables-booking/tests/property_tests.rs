//! Property-based tests for payables-booking.
//!
//! Run with: cargo test -p payables-booking --test `property_tests`

use chrono::{NaiveDate, TimeZone, Utc};
use payables_audit::AuditContext;
use payables_booking::{
    autocomplete, is_balanced, reverse, set_percentage, settle, Settlement,
};
use payables_core::money::SETTLEMENT_EPSILON;
use payables_core::{AllocationEntry, Decimal, Installment, InstallmentId, Invoice};
use proptest::prelude::*;

fn ctx() -> AuditContext {
    AuditContext::new("prop", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn due(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1 + offset % 12, 10).unwrap()
}

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_value() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_invoice() -> impl Strategy<Value = Invoice> {
    prop::collection::vec(arb_value(), 1..6).prop_map(|values| {
        let total: Decimal = values.iter().copied().sum();
        let mut invoice = Invoice::new("NF-P", "Supplier", total);
        for (i, value) in values.into_iter().enumerate() {
            invoice = invoice.with_installment(Installment::new(
                InstallmentId(i as u64 + 1),
                value,
                due(i as u32),
            ));
        }
        payables_booking::renumber(&mut invoice.installments);
        invoice
    })
}

/// An invoice, an installment index and a fraction (in basis points) of its value.
fn arb_settlement_case() -> impl Strategy<Value = (Invoice, usize, i64)> {
    arb_invoice().prop_flat_map(|invoice| {
        let len = invoice.installments.len();
        (Just(invoice), 0..len, 1i64..=10_000i64)
    })
}

fn fraction_of(value: Decimal, bps: i64) -> Decimal {
    payables_core::round2(value * Decimal::new(bps, 4)).max(Decimal::new(1, 2))
}

// ============================================================================
// Settlement Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Settling moves the installment total by at most the settlement tolerance
    #[test]
    fn prop_settlement_preserves_total((invoice, index, bps) in arb_settlement_case()) {
        let amount = fraction_of(invoice.installments[index].value, bps);
        let result = settle(&invoice, index, &Settlement::new(amount, due(0)), &ctx()).unwrap();
        let drift = (result.invoice.installment_total() - invoice.installment_total()).abs();
        prop_assert!(drift <= SETTLEMENT_EPSILON);
    }

    /// Sequence denominators always equal the list length
    #[test]
    fn prop_labels_match_length((invoice, index, bps) in arb_settlement_case()) {
        let amount = fraction_of(invoice.installments[index].value, bps);
        let result = settle(&invoice, index, &Settlement::new(amount, due(0)), &ctx()).unwrap();
        let len = result.invoice.installments.len();
        for (i, inst) in result.invoice.installments.iter().enumerate() {
            prop_assert_eq!(inst.sequence.number, i + 1);
            prop_assert_eq!(inst.sequence.of, len);
        }
    }

    /// Reversal undoes any accepted settlement
    #[test]
    fn prop_reversal_round_trip((invoice, index, bps) in arb_settlement_case()) {
        let amount = fraction_of(invoice.installments[index].value, bps);
        let settled = settle(&invoice, index, &Settlement::new(amount, due(0)), &ctx())
            .unwrap()
            .invoice;
        let reversed = reverse(&settled, index, &ctx()).unwrap().invoice;
        prop_assert_eq!(reversed, invoice);
    }

    /// Amounts beyond the outstanding balance are always rejected
    #[test]
    fn prop_over_settlement_rejected(
        (invoice, index, _bps) in arb_settlement_case(),
        excess in 2i64..100_000i64
    ) {
        let due_now = invoice.installments[index].outstanding();
        let amount = due_now + SETTLEMENT_EPSILON + Decimal::new(excess - 1, 2);
        prop_assert!(settle(&invoice, index, &Settlement::new(amount, due(0)), &ctx()).is_err());
    }
}

// ============================================================================
// Allocation Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Setting one of two blank entries always balances the list
    #[test]
    fn prop_two_entries_balance(pct in 0i64..=10_000i64, target in arb_value()) {
        let list = vec![AllocationEntry::new("A"), AllocationEntry::new("B")];
        let result = set_percentage(&list, 0, Decimal::new(pct, 2), target).unwrap();
        prop_assert!(is_balanced(&result, target));
    }

    /// Auto-completed values are never negative
    #[test]
    fn prop_autocomplete_non_negative(
        values in prop::collection::vec(arb_value(), 1..5),
        target in arb_value()
    ) {
        let mut list: Vec<AllocationEntry> = values
            .into_iter()
            .map(|v| AllocationEntry::new("x").with_value(v))
            .collect();
        list.push(AllocationEntry::new("rest"));
        let filled = autocomplete(&mut list, target);
        prop_assert!(filled.contains(&(list.len() - 1)));
        prop_assert!(list.iter().all(|e| e.value.is_some_and(|v| v >= Decimal::ZERO)));
    }
}
