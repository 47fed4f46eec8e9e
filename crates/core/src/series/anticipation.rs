//! Installment anticipation.
//!
//! Anticipating pays a subset of a series early, consolidated into a single
//! settlement entry with an optional discount. This module computes the
//! complete [`AnticipationPlan`] from a request and the current series state;
//! the repository re-reads the series under lock, calls [`AnticipationService::plan`]
//! and writes the plan in one transaction.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use hearth_shared::types::{AnticipationId, EntryId, Period, PeriodParseError};

use super::eligibility::EligibilitySelector;
use super::error::SeriesError;
use super::types::{
    Anticipation, AnticipationPlan, AnticipationRequest, Condition, SeriesEntry, Settlement,
};

/// Stateless planner for anticipations.
pub struct AnticipationService;

impl AnticipationService {
    /// Validates the parts of a request that do not depend on stored state.
    ///
    /// Checks run in a fixed order: selection, period, discount.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection`, `InvalidPeriod` or `NegativeDiscount`.
    pub fn validate_request(request: &AnticipationRequest) -> Result<Period, SeriesError> {
        if request.entry_ids.is_empty() {
            return Err(SeriesError::EmptySelection);
        }
        let period: Period = request
            .anticipation_period
            .trim()
            .parse()
            .map_err(|e: PeriodParseError| SeriesError::InvalidPeriod(e.to_string()))?;
        if request.discount < Decimal::ZERO {
            return Err(SeriesError::NegativeDiscount);
        }
        Ok(period)
    }

    /// Plans an anticipation of `request.entry_ids` against `series`.
    ///
    /// `series` must be the current entries of the request's series.
    /// Duplicate IDs in the request are ignored.
    ///
    /// # Errors
    ///
    /// - Any error from [`Self::validate_request`].
    /// - `SeriesNotFound` if `series` is empty.
    /// - `StaleEligibility` if a selected entry is not an eligible member.
    /// - `DiscountExceedsTotal` if the discount is larger than the total.
    pub fn plan(
        request: &AnticipationRequest,
        series: &[SeriesEntry],
    ) -> Result<AnticipationPlan, SeriesError> {
        let period = Self::validate_request(request)?;

        let members: Vec<SeriesEntry> = series
            .iter()
            .filter(|e| e.series_id == Some(request.series_id) && e.user_id == request.user_id)
            .cloned()
            .collect();
        if members.is_empty() {
            return Err(SeriesError::SeriesNotFound(request.series_id));
        }

        let eligible = EligibilitySelector::select(&members);
        let mut seen = HashSet::new();
        let mut covered: Vec<&SeriesEntry> = Vec::with_capacity(request.entry_ids.len());
        for id in &request.entry_ids {
            if !seen.insert(*id) {
                continue;
            }
            let entry = eligible
                .iter()
                .copied()
                .find(|e| e.id == *id)
                .ok_or(SeriesError::StaleEligibility(*id))?;
            covered.push(entry);
        }
        covered.sort_by_key(|e| e.position());

        let total: Decimal = covered.iter().map(|e| e.amount).sum();
        if request.discount > total.abs() {
            return Err(SeriesError::DiscountExceedsTotal {
                discount: request.discount,
                total,
            });
        }

        let first = covered[0];
        let last = covered[covered.len() - 1];
        let anticipation_id = AnticipationId::new();
        let consolidated = SeriesEntry {
            id: EntryId::new(),
            user_id: request.user_id,
            series_id: None,
            transaction_type: first.transaction_type,
            condition: Condition::OneOff,
            payment_method: first.payment_method,
            description: Self::consolidated_description(first, last),
            amount: apply_discount(total, request.discount),
            purchase_date: request.anticipation_date,
            period,
            due_date: None,
            settlement_date: None,
            current_installment: None,
            installment_count: None,
            settlement: match first.settlement {
                Settlement::NotApplicable => Settlement::NotApplicable,
                _ => Settlement::Unsettled,
            },
            is_anticipated: false,
            anticipation_id: Some(anticipation_id),
            covered_by_anticipation_id: None,
            payer_id: request.payer_id.or(first.payer_id),
            account_id: first.account_id,
            card_id: first.card_id,
            category_id: request.category_id.or(first.category_id),
            note: request.note.clone().or_else(|| first.note.clone()),
        };

        #[allow(clippy::cast_possible_truncation)]
        let anticipation = Anticipation {
            id: anticipation_id,
            user_id: request.user_id,
            series_id: request.series_id,
            entry_id: consolidated.id,
            installment_count: covered.len() as u32,
            total_amount: total,
            discount: request.discount,
            anticipation_date: request.anticipation_date,
            anticipation_period: period,
            payer_id: request.payer_id,
            category_id: request.category_id,
            note: request.note.clone(),
        };

        Ok(AnticipationPlan {
            anticipation,
            consolidated,
            covered: covered.into_iter().map(|e| e.id).collect(),
        })
    }

    /// Returns `entry` as it looks once `plan` is applied.
    ///
    /// Entries the plan does not cover are returned unchanged.
    #[cfg(test)]
    #[must_use]
    pub fn cover(entry: &SeriesEntry, plan: &AnticipationPlan) -> SeriesEntry {
        if !plan.covered.contains(&entry.id) {
            return entry.clone();
        }
        SeriesEntry {
            is_anticipated: true,
            covered_by_anticipation_id: Some(plan.anticipation.id),
            ..entry.clone()
        }
    }

    fn consolidated_description(first: &SeriesEntry, last: &SeriesEntry) -> String {
        let range = if first.position() == last.position() {
            first.position().to_string()
        } else {
            format!("{}-{}", first.position(), last.position())
        };
        match first.installment_count {
            Some(count) => format!("{} (anticipated {range}/{count})", first.description),
            None => format!("{} (anticipated {range})", first.description),
        }
    }
}

/// Applies `discount` to `total`, reducing its magnitude.
///
/// Stored amounts are non-negative, so this is `total - discount`; a
/// negative total moves towards zero instead.
#[must_use]
pub fn apply_discount(total: Decimal, discount: Decimal) -> Decimal {
    if total < Decimal::ZERO {
        total + discount
    } else {
        total - discount
    }
}

/// Today's date in UTC, the default anticipation and settlement date.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
