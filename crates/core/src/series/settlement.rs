//! Settlement toggling for a single entry.

use chrono::NaiveDate;

use super::error::SeriesError;
use super::types::{SeriesEntry, Settlement};

/// Stateless service deciding the settlement state of an entry.
pub struct SettlementService;

impl SettlementService {
    /// Computes the new settlement state and date for `entry`.
    ///
    /// Settling records `date`; unsettling clears it.
    ///
    /// # Errors
    ///
    /// - `AnticipationLinked` if an anticipation covers the entry.
    /// - `SettlementNotApplicable` if the entry is settled by an invoice.
    pub fn toggle(
        entry: &SeriesEntry,
        settled: bool,
        date: NaiveDate,
    ) -> Result<(Settlement, Option<NaiveDate>), SeriesError> {
        if entry.is_anticipated {
            return Err(SeriesError::AnticipationLinked(entry.id));
        }
        if entry.settlement == Settlement::NotApplicable {
            return Err(SeriesError::SettlementNotApplicable(entry.id));
        }

        if settled {
            Ok((Settlement::Settled, Some(date)))
        } else {
            Ok((Settlement::Unsettled, None))
        }
    }
}
