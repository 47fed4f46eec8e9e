//! Property-based tests for ScopeResolver.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use hearth_shared::types::UserId;

use crate::series::expander::{MAX_RECURRENCES, MIN_SERIES_LENGTH, SeriesExpander};
use crate::series::scope::ScopeResolver;
use crate::series::types::{
    Condition, EntryTemplate, PaymentMethod, Scope, SeriesEntry, TransactionType,
};

fn recurring(count: u32) -> Vec<SeriesEntry> {
    SeriesExpander::expand(&EntryTemplate {
        user_id: UserId::new(),
        transaction_type: TransactionType::Expense,
        condition: Condition::Recurring,
        payment_method: PaymentMethod::DebitCard,
        description: "Streaming".to_string(),
        amount: Decimal::new(1990, 2),
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        due_date: None,
        installment_count: None,
        recurrence_count: Some(count),
        settled: false,
        payer_id: None,
        account_id: None,
        card_id: None,
        category_id: None,
        note: None,
    })
    .unwrap()
}

/// Strategy for a series length and a 1-based reference position inside it.
fn arb_series_and_position() -> impl Strategy<Value = (u32, u32)> {
    (MIN_SERIES_LENGTH..=MAX_RECURRENCES).prop_flat_map(|n| (Just(n), 1..=n))
}

fn positions(ids: &[hearth_shared::types::EntryId], entries: &[SeriesEntry]) -> Vec<u32> {
    ids.iter()
        .filter_map(|id| entries.iter().find(|e| e.id == *id))
        .map(SeriesEntry::position)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// `current` resolves to {k}
    #[test]
    fn prop_current_is_reference_only((n, k) in arb_series_and_position()) {
        let entries = recurring(n);
        let reference = &entries[(k - 1) as usize];
        let ids = ScopeResolver::resolve(reference, &entries, Scope::Current);
        prop_assert_eq!(ids, vec![reference.id]);
    }

    /// `future` resolves to {k..N} in order
    #[test]
    fn prop_future_is_tail((n, k) in arb_series_and_position()) {
        let entries = recurring(n);
        let reference = &entries[(k - 1) as usize];
        let ids = ScopeResolver::resolve(reference, &entries, Scope::Future);
        prop_assert_eq!(positions(&ids, &entries), (k..=n).collect::<Vec<_>>());
    }

    /// `all` resolves to {1..N} wherever the reference sits
    #[test]
    fn prop_all_is_whole_series((n, k) in arb_series_and_position()) {
        let entries = recurring(n);
        let reference = &entries[(k - 1) as usize];
        let ids = ScopeResolver::resolve(reference, &entries, Scope::All);
        prop_assert_eq!(positions(&ids, &entries), (1..=n).collect::<Vec<_>>());
    }
}
