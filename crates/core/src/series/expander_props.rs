//! Property-based tests for SeriesExpander.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use hearth_shared::types::UserId;

use crate::series::expander::{MAX_INSTALLMENTS, MIN_SERIES_LENGTH, SeriesExpander, split_amount};
use crate::series::types::{Condition, EntryTemplate, PaymentMethod, TransactionType};

/// Strategy for generating cent-precision amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_installment_count() -> impl Strategy<Value = u32> {
    MIN_SERIES_LENGTH..=MAX_INSTALLMENTS
}

fn arb_purchase_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn installment_template(amount: Decimal, count: u32, purchase_date: NaiveDate) -> EntryTemplate {
    EntryTemplate {
        user_id: UserId::new(),
        transaction_type: TransactionType::Expense,
        condition: Condition::Installment,
        payment_method: PaymentMethod::BankSlip,
        description: "Generated".to_string(),
        amount,
        purchase_date,
        due_date: Some(purchase_date),
        installment_count: Some(count),
        recurrence_count: None,
        settled: false,
        payer_id: None,
        account_id: None,
        card_id: None,
        category_id: None,
        note: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Installments sum exactly to the purchase total
    #[test]
    fn prop_installments_sum_to_total(
        amount in arb_amount(),
        count in arb_installment_count(),
        date in arb_purchase_date(),
    ) {
        let entries = SeriesExpander::expand(&installment_template(amount, count, date)).unwrap();
        let sum: Decimal = entries.iter().map(|e| e.amount).sum();
        prop_assert_eq!(sum, amount);
        prop_assert_eq!(entries.len(), count as usize);
    }

    /// Only the first installment differs, and only by less than `count` cents
    #[test]
    fn prop_first_installment_absorbs_remainder(
        amount in arb_amount(),
        count in arb_installment_count(),
    ) {
        let shares = split_amount(amount, count);
        let rest = shares[1];
        prop_assert!(shares[1..].iter().all(|s| *s == rest));
        prop_assert!(shares[0] >= rest);
        prop_assert!(shares[0] - rest < Decimal::new(i64::from(count), 2));
        prop_assert!(shares.iter().all(|s| s.scale() <= 2));
    }

    /// Positions are 1..=N and periods advance one month per step
    #[test]
    fn prop_positions_and_periods_are_contiguous(
        amount in arb_amount(),
        count in arb_installment_count(),
        date in arb_purchase_date(),
    ) {
        let entries = SeriesExpander::expand(&installment_template(amount, count, date)).unwrap();
        let series_id = entries[0].series_id;
        prop_assert!(series_id.is_some());

        for (step, entry) in (0u32..).zip(&entries) {
            prop_assert_eq!(entry.series_id, series_id);
            prop_assert_eq!(entry.current_installment, Some(step + 1));
            prop_assert_eq!(Some(entry.period), entries[0].period.checked_add_months(step));
        }
    }

    /// Every generated entry gets a distinct ID
    #[test]
    fn prop_entry_ids_are_unique(count in arb_installment_count()) {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = SeriesExpander::expand(&installment_template(Decimal::new(100, 0), count, date)).unwrap();
        let mut ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.into_inner());
        ids.dedup();
        prop_assert_eq!(ids.len(), entries.len());
    }
}
