//! Eligibility for anticipation.

use super::types::SeriesEntry;

/// Stateless filter over the entries of one series.
pub struct EligibilitySelector;

impl EligibilitySelector {
    /// Returns the entries that can still be anticipated, ordered by position.
    ///
    /// An entry is eligible while it is not `Settled` and not already covered
    /// by an anticipation. The set is recomputed from current state every time.
    #[must_use]
    pub fn select(series: &[SeriesEntry]) -> Vec<&SeriesEntry> {
        let mut eligible: Vec<&SeriesEntry> =
            series.iter().filter(|e| e.is_eligible()).collect();
        eligible.sort_by_key(|e| e.position());
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::expander::SeriesExpander;
    use crate::series::types::{
        Condition, EntryTemplate, PaymentMethod, Settlement, TransactionType,
    };
    use chrono::NaiveDate;
    use hearth_shared::types::{AnticipationId, UserId};
    use rust_decimal_macros::dec;

    fn series(payment_method: PaymentMethod) -> Vec<SeriesEntry> {
        SeriesExpander::expand(&EntryTemplate {
            user_id: UserId::new(),
            transaction_type: TransactionType::Expense,
            condition: Condition::Installment,
            payment_method,
            description: "Phone".to_string(),
            amount: dec!(600),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            due_date: None,
            installment_count: Some(6),
            recurrence_count: None,
            settled: false,
            payer_id: None,
            account_id: None,
            card_id: None,
            category_id: None,
            note: None,
        })
        .unwrap()
    }

    #[test]
    fn test_fresh_series_is_fully_eligible() {
        let entries = series(PaymentMethod::Cash);
        assert_eq!(EligibilitySelector::select(&entries).len(), 6);
    }

    #[test]
    fn test_excludes_settled_and_anticipated() {
        let mut entries = series(PaymentMethod::Cash);
        entries[0].settlement = Settlement::Settled;
        entries[1].settlement = Settlement::Settled;
        entries[5].is_anticipated = true;
        entries[5].covered_by_anticipation_id = Some(AnticipationId::new());

        let positions: Vec<u32> = EligibilitySelector::select(&entries)
            .iter()
            .map(|e| e.position())
            .collect();
        assert_eq!(positions, vec![3, 4, 5]);
    }

    #[test]
    fn test_not_applicable_entries_stay_eligible() {
        let entries = series(PaymentMethod::CreditCard);
        assert_eq!(EligibilitySelector::select(&entries).len(), 6);
    }

    #[test]
    fn test_orders_by_position() {
        let mut entries = series(PaymentMethod::Cash);
        entries.reverse();
        let positions: Vec<u32> = EligibilitySelector::select(&entries)
            .iter()
            .map(|e| e.position())
            .collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
    }
}
