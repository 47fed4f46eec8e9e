//! Series template expansion.
//!
//! Turns one creation template into the individual entries of a series:
//! one entry per month starting at the purchase month, all sharing a freshly
//! generated series ID.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use hearth_shared::types::{EntryId, Period, SeriesId};

use super::error::SeriesError;
use super::types::{Condition, EntryTemplate, SeriesEntry, Settlement};

/// Shortest allowed series.
pub const MIN_SERIES_LENGTH: u32 = 2;
/// Longest allowed installment plan.
pub const MAX_INSTALLMENTS: u32 = 24;
/// Longest allowed fixed recurrence.
pub const MAX_RECURRENCES: u32 = 47;
/// Occurrences materialised for an open-ended recurrence.
pub const DEFAULT_RECURRENCE_HORIZON: u32 = 12;

/// Stateless service that expands templates into entries.
pub struct SeriesExpander;

impl SeriesExpander {
    /// Validates a template and expands it into entries.
    ///
    /// - `OneOff` yields a single entry without series fields.
    /// - `Installment` splits the template amount over N entries; the
    ///   remainder goes to the first installment.
    /// - `Recurring` repeats the template amount N times (or
    ///   [`DEFAULT_RECURRENCE_HORIZON`] times when open-ended).
    ///
    /// # Errors
    ///
    /// Returns `SeriesError` if the amount is negative or finer than a cent,
    /// the count is out of range, a count is supplied for a condition that
    /// does not take one, or the series would run past 9999-12.
    pub fn expand(template: &EntryTemplate) -> Result<Vec<SeriesEntry>, SeriesError> {
        check_amount(template.amount)?;

        match template.condition {
            Condition::OneOff => {
                Self::reject_count(template.installment_count, "installment_count", template)?;
                Self::reject_count(template.recurrence_count, "recurrence_count", template)?;
                let periods = Self::periods(template, 1)?;
                Ok(vec![Self::one_off(template, periods[0])])
            }
            Condition::Installment => {
                Self::reject_count(template.recurrence_count, "recurrence_count", template)?;
                let count = template.installment_count.unwrap_or(0);
                if !(MIN_SERIES_LENGTH..=MAX_INSTALLMENTS).contains(&count) {
                    return Err(SeriesError::InvalidInstallmentCount(count));
                }
                let periods = Self::periods(template, count)?;
                let amounts = split_amount(template.amount, count);
                Ok(Self::series(template, &amounts, &periods, Some(count)))
            }
            Condition::Recurring => {
                Self::reject_count(template.installment_count, "installment_count", template)?;
                let declared = match template.recurrence_count {
                    Some(count) if !(MIN_SERIES_LENGTH..=MAX_RECURRENCES).contains(&count) => {
                        return Err(SeriesError::InvalidRecurrenceCount(count));
                    }
                    other => other,
                };
                let count = declared.unwrap_or(DEFAULT_RECURRENCE_HORIZON);
                let periods = Self::periods(template, count)?;
                let amounts = vec![template.amount; count as usize];
                Ok(Self::series(template, &amounts, &periods, declared))
            }
        }
    }

    fn reject_count(
        count: Option<u32>,
        field: &'static str,
        template: &EntryTemplate,
    ) -> Result<(), SeriesError> {
        if count.is_some() {
            return Err(SeriesError::UnexpectedCount {
                field,
                condition: template.condition,
            });
        }
        Ok(())
    }

    /// Booking periods for `count` consecutive months from the purchase month.
    fn periods(template: &EntryTemplate, count: u32) -> Result<Vec<Period>, SeriesError> {
        let out_of_range = || SeriesError::PeriodOutOfRange {
            start: template.purchase_date.format("%Y-%m").to_string(),
            count,
        };
        let start = Period::from_date(template.purchase_date).map_err(|_| out_of_range())?;
        (0..count)
            .map(|step| start.checked_add_months(step).ok_or_else(out_of_range))
            .collect()
    }

    fn one_off(template: &EntryTemplate, period: Period) -> SeriesEntry {
        let mut entry = Self::entry(template, None, template.amount, 0, period, None);
        if template.settled && entry.settlement == Settlement::Unsettled {
            entry.settlement = Settlement::Settled;
            entry.settlement_date = Some(template.purchase_date);
        }
        entry
    }

    fn series(
        template: &EntryTemplate,
        amounts: &[Decimal],
        periods: &[Period],
        installment_count: Option<u32>,
    ) -> Vec<SeriesEntry> {
        let series_id = SeriesId::new();
        (0u32..)
            .zip(amounts.iter().zip(periods))
            .map(|(step, (amount, period))| {
                let mut entry = Self::entry(
                    template,
                    Some(series_id),
                    *amount,
                    step,
                    *period,
                    installment_count,
                );
                entry.current_installment = Some(step + 1);
                entry
            })
            .collect()
    }

    fn entry(
        template: &EntryTemplate,
        series_id: Option<SeriesId>,
        amount: Decimal,
        step: u32,
        period: Period,
        installment_count: Option<u32>,
    ) -> SeriesEntry {
        // An installment purchase happens once; a recurring charge happens every month.
        let purchase_date = if template.condition == Condition::Recurring {
            add_months_clamped(template.purchase_date, step)
        } else {
            template.purchase_date
        };

        SeriesEntry {
            id: EntryId::new(),
            user_id: template.user_id,
            series_id,
            transaction_type: template.transaction_type,
            condition: template.condition,
            payment_method: template.payment_method,
            description: template.description.clone(),
            amount,
            purchase_date,
            period,
            due_date: template.due_date.map(|d| add_months_clamped(d, step)),
            settlement_date: None,
            current_installment: None,
            installment_count,
            settlement: Settlement::initial_for(template.payment_method),
            is_anticipated: false,
            anticipation_id: None,
            covered_by_anticipation_id: None,
            payer_id: template.payer_id,
            account_id: template.account_id,
            card_id: template.card_id,
            category_id: template.category_id,
            note: template.note.clone(),
        }
    }
}

/// Rejects negative amounts and amounts finer than a cent.
///
/// # Errors
///
/// Returns `NegativeAmount` or `InvalidAmountScale`.
pub fn check_amount(amount: Decimal) -> Result<(), SeriesError> {
    if amount < Decimal::ZERO {
        return Err(SeriesError::NegativeAmount);
    }
    if amount.normalize().scale() > 2 {
        return Err(SeriesError::InvalidAmountScale(amount));
    }
    Ok(())
}

/// Splits `total` into `count` cent-precision shares that sum to `total`.
///
/// Every share is `total / count` truncated to the cent; whatever is left
/// over is added to the first share.
#[must_use]
pub fn split_amount(total: Decimal, count: u32) -> Vec<Decimal> {
    if count == 0 {
        return Vec::new();
    }
    let share = (total / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let remainder = total - share * Decimal::from(count);

    let mut shares = vec![share; count as usize];
    shares[0] += remainder;
    shares
}

/// Adds calendar months, clamping to the last day of shorter months.
fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}
