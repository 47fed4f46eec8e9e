//! Property-based tests for anticipation and its reversal.
//!
//! Applying a plan and then reversing it must leave the series exactly as it
//! was, and eligibility must never offer settled or anticipated entries.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use hearth_shared::types::UserId;

use crate::series::anticipation::AnticipationService;
use crate::series::eligibility::EligibilitySelector;
use crate::series::expander::{MAX_INSTALLMENTS, MIN_SERIES_LENGTH, SeriesExpander};
use crate::series::reversal::ReversalService;
use crate::series::types::{
    AnticipationRequest, Condition, EntryTemplate, PaymentMethod, SeriesEntry, Settlement,
    TransactionType,
};

fn arb_transaction_type() -> impl Strategy<Value = TransactionType> {
    prop_oneof![
        Just(TransactionType::Expense),
        Just(TransactionType::Income),
        Just(TransactionType::Transfer),
    ]
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (2_400i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Series length and the 1-based position the anticipated tail starts at.
fn arb_count_and_start() -> impl Strategy<Value = (u32, u32)> {
    (MIN_SERIES_LENGTH..=MAX_INSTALLMENTS).prop_flat_map(|n| (Just(n), 1..=n))
}

fn series(transaction_type: TransactionType, amount: Decimal, count: u32) -> Vec<SeriesEntry> {
    SeriesExpander::expand(&EntryTemplate {
        user_id: UserId::new(),
        transaction_type,
        condition: Condition::Installment,
        payment_method: PaymentMethod::Cash,
        description: "Generated".to_string(),
        amount,
        purchase_date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        due_date: None,
        installment_count: Some(count),
        recurrence_count: None,
        settled: false,
        payer_id: None,
        account_id: None,
        card_id: None,
        category_id: None,
        note: Some("note".to_string()),
    })
    .unwrap()
}

fn tail_request(entries: &[SeriesEntry], start: u32, discount: Decimal) -> AnticipationRequest {
    AnticipationRequest {
        user_id: entries[0].user_id,
        series_id: entries[0].series_id.unwrap(),
        entry_ids: entries[(start - 1) as usize..].iter().map(|e| e.id).collect(),
        anticipation_period: "2025-01".to_string(),
        discount,
        anticipation_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        payer_id: None,
        category_id: None,
        note: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Anticipating then cancelling restores every entry field for field
    #[test]
    fn prop_anticipation_round_trip(
        transaction_type in arb_transaction_type(),
        amount in arb_amount(),
        (count, start) in arb_count_and_start(),
    ) {
        let original = series(transaction_type, amount, count);
        let plan = AnticipationService::plan(&tail_request(&original, start, Decimal::ZERO), &original).unwrap();

        let anticipated: Vec<SeriesEntry> = original
            .iter()
            .map(|e| AnticipationService::cover(e, &plan))
            .collect();
        let reversal = ReversalService::plan(&plan.anticipation, &plan.consolidated, &anticipated).unwrap();
        prop_assert_eq!(&reversal.restored, &plan.covered);

        let restored: Vec<SeriesEntry> = anticipated
            .iter()
            .map(|e| {
                if reversal.restored.contains(&e.id) {
                    ReversalService::restore(e)
                } else {
                    e.clone()
                }
            })
            .collect();
        prop_assert_eq!(restored, original);
    }

    /// The consolidated amount is the covered total minus the discount
    #[test]
    fn prop_consolidated_amount_is_discounted_total(
        transaction_type in arb_transaction_type(),
        amount in arb_amount(),
        (count, start) in arb_count_and_start(),
        discount_cents in 0i64..100,
    ) {
        let entries = series(transaction_type, amount, count);
        let discount = Decimal::new(discount_cents, 2);
        let plan = AnticipationService::plan(&tail_request(&entries, start, discount), &entries).unwrap();

        let total: Decimal = entries[(start - 1) as usize..].iter().map(|e| e.amount).sum();
        prop_assert_eq!(plan.anticipation.total_amount, total);
        prop_assert_eq!(plan.consolidated.amount, total - discount);
        prop_assert_eq!(plan.anticipation.installment_count, count - start + 1);
    }

    /// Eligibility never includes settled or anticipated entries
    #[test]
    fn prop_eligibility_excludes_settled_and_anticipated(
        (count, start) in arb_count_and_start(),
        settled_mask in prop::collection::vec(any::<bool>(), 24),
    ) {
        let mut entries = series(TransactionType::Expense, Decimal::new(100_000, 2), count);
        for (entry, settled) in entries.iter_mut().zip(&settled_mask) {
            if *settled && entry.position() < start {
                entry.settlement = Settlement::Settled;
            }
        }
        let plan = AnticipationService::plan(&tail_request(&entries, start, Decimal::ZERO), &entries).unwrap();
        let after: Vec<SeriesEntry> = entries
            .iter()
            .map(|e| AnticipationService::cover(e, &plan))
            .collect();

        let eligible = EligibilitySelector::select(&after);
        prop_assert!(eligible.iter().all(|e| !e.settlement.is_settled() && !e.is_anticipated));
        prop_assert!(eligible.iter().all(|e| e.position() < start));
        prop_assert!(eligible.windows(2).all(|w| w[0].position() < w[1].position()));
    }
}
