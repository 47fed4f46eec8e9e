//! Scope resolution for bulk edit and delete.

use hearth_shared::types::EntryId;

use super::error::SeriesError;
use super::expander::check_amount;
use super::types::{EntryPatch, Scope, SeriesEntry};

/// Stateless service mapping a reference entry and a scope to target entries.
pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolves the entries a bulk operation on `reference` touches.
    ///
    /// `series` holds the entries sharing the reference's series (it may
    /// include the reference itself). Entries outside a series always resolve
    /// to the reference alone. The result is ordered by position.
    #[must_use]
    pub fn resolve(reference: &SeriesEntry, series: &[SeriesEntry], scope: Scope) -> Vec<EntryId> {
        let Some(series_id) = reference.series_id else {
            return vec![reference.id];
        };

        let mut members: Vec<&SeriesEntry> = series
            .iter()
            .filter(|e| e.series_id == Some(series_id))
            .filter(|e| match scope {
                Scope::Current => e.id == reference.id,
                Scope::Future => e.position() >= reference.position(),
                Scope::All => true,
            })
            .collect();

        if !members.iter().any(|e| e.id == reference.id) {
            members.push(reference);
        }
        members.sort_by_key(|e| e.position());
        members.into_iter().map(|e| e.id).collect()
    }

    /// Scopes that make sense for `entry`. One-off entries offer only `Current`.
    #[must_use]
    pub fn available_scopes(entry: &SeriesEntry) -> Vec<Scope> {
        if entry.series_id.is_some() {
            vec![Scope::Current, Scope::Future, Scope::All]
        } else {
            vec![Scope::Current]
        }
    }

    /// Validates a bulk edit over the resolved `targets`.
    ///
    /// # Errors
    ///
    /// - `EmptyPatch` if the patch changes nothing.
    /// - `NegativeAmount` if the new amount is negative.
    /// - `InvalidAmountScale` if the new amount is finer than a cent.
    /// - `AnticipationLinked` if the amount changes on an entry taking part
    ///   in an anticipation.
    pub fn check_edit(patch: &EntryPatch, targets: &[SeriesEntry]) -> Result<(), SeriesError> {
        if patch.is_empty() {
            return Err(SeriesError::EmptyPatch);
        }
        if let Some(amount) = patch.amount {
            check_amount(amount)?;
            if let Some(linked) = targets.iter().find(|e| e.is_anticipation_linked()) {
                return Err(SeriesError::AnticipationLinked(linked.id));
            }
        }
        Ok(())
    }

    /// Validates a bulk delete over the resolved `targets`.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationLinked` if any target takes part in an anticipation.
    pub fn check_delete(targets: &[SeriesEntry]) -> Result<(), SeriesError> {
        match targets.iter().find(|e| e.is_anticipation_linked()) {
            Some(linked) => Err(SeriesError::AnticipationLinked(linked.id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::expander::SeriesExpander;
    use crate::series::types::{Condition, EntryTemplate, PaymentMethod, TransactionType};
    use chrono::NaiveDate;
    use hearth_shared::types::{AnticipationId, UserId};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn series(count: u32) -> Vec<SeriesEntry> {
        SeriesExpander::expand(&EntryTemplate {
            user_id: UserId::new(),
            transaction_type: TransactionType::Expense,
            condition: Condition::Installment,
            payment_method: PaymentMethod::BankSlip,
            description: "Sofa".to_string(),
            amount: dec!(500),
            purchase_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            due_date: None,
            installment_count: Some(count),
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

    fn positions(ids: &[EntryId], entries: &[SeriesEntry]) -> Vec<u32> {
        ids.iter()
            .map(|id| entries.iter().find(|e| e.id == *id).unwrap().position())
            .collect()
    }

    #[rstest]
    #[case(Scope::Current, vec![3])]
    #[case(Scope::Future, vec![3, 4, 5])]
    #[case(Scope::All, vec![1, 2, 3, 4, 5])]
    fn test_resolve_third_of_five(#[case] scope: Scope, #[case] expected: Vec<u32>) {
        let entries = series(5);
        let ids = ScopeResolver::resolve(&entries[2], &entries, scope);
        assert_eq!(positions(&ids, &entries), expected);
    }

    #[test]
    fn test_resolve_is_ordered_regardless_of_input_order() {
        let entries = series(4);
        let mut shuffled = entries.clone();
        shuffled.reverse();
        let ids = ScopeResolver::resolve(&entries[0], &shuffled, Scope::All);
        assert_eq!(positions(&ids, &entries), vec![1, 2, 3, 4]);
    }

    #[rstest]
    #[case(Scope::Current)]
    #[case(Scope::Future)]
    #[case(Scope::All)]
    fn test_one_off_resolves_to_itself(#[case] scope: Scope) {
        let mut entry = series(2).remove(0);
        entry.series_id = None;
        entry.current_installment = None;
        let others = series(3);
        assert_eq!(ScopeResolver::resolve(&entry, &others, scope), vec![entry.id]);
    }

    #[test]
    fn test_resolve_ignores_entries_from_other_series() {
        let mut entries = series(3);
        let foreign = series(3);
        entries.extend(foreign);
        let ids = ScopeResolver::resolve(&entries[0], &entries, Scope::All);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_available_scopes() {
        let mut entry = series(2).remove(0);
        assert_eq!(ScopeResolver::available_scopes(&entry).len(), 3);
        entry.series_id = None;
        assert_eq!(ScopeResolver::available_scopes(&entry), vec![Scope::Current]);
    }

    #[test]
    fn test_check_edit_rejects_empty_patch() {
        let entries = series(2);
        assert!(matches!(
            ScopeResolver::check_edit(&EntryPatch::default(), &entries),
            Err(SeriesError::EmptyPatch)
        ));
    }

    #[test]
    fn test_check_edit_rejects_negative_amount() {
        let patch = EntryPatch {
            amount: Some(dec!(-5)),
            ..Default::default()
        };
        assert!(matches!(
            ScopeResolver::check_edit(&patch, &series(2)),
            Err(SeriesError::NegativeAmount)
        ));
    }

    #[rstest]
    #[case(dec!(12.345), false)]
    #[case(dec!(0.001), false)]
    #[case(dec!(12.34), true)]
    #[case(dec!(12.3400), true)]
    fn test_check_edit_amount_scale(#[case] amount: Decimal, #[case] ok: bool) {
        let patch = EntryPatch {
            amount: Some(amount),
            ..Default::default()
        };
        let result = ScopeResolver::check_edit(&patch, &series(2));
        assert_eq!(result.is_ok(), ok);
        if !ok {
            assert!(matches!(result, Err(SeriesError::InvalidAmountScale(a)) if a == amount));
        }
    }

    #[test]
    fn test_check_edit_amount_on_anticipated_entry() {
        let mut entries = series(3);
        entries[2].is_anticipated = true;
        entries[2].covered_by_anticipation_id = Some(AnticipationId::new());

        let amount = EntryPatch {
            amount: Some(dec!(10)),
            ..Default::default()
        };
        assert!(matches!(
            ScopeResolver::check_edit(&amount, &entries),
            Err(SeriesError::AnticipationLinked(id)) if id == entries[2].id
        ));

        let note = EntryPatch {
            note: Some(Some("renamed".to_string())),
            ..Default::default()
        };
        assert!(ScopeResolver::check_edit(&note, &entries).is_ok());
    }

    #[test]
    fn test_check_delete() {
        let mut entries = series(3);
        assert!(ScopeResolver::check_delete(&entries).is_ok());

        entries[0].anticipation_id = Some(AnticipationId::new());
        assert!(matches!(
            ScopeResolver::check_delete(&entries),
            Err(SeriesError::AnticipationLinked(_))
        ));
    }
}
