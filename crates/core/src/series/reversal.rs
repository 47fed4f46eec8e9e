//! Anticipation reversal.
//!
//! Cancelling an anticipation removes the consolidated entry and the
//! anticipation row and returns the covered entries to their eligible state.
//! The service only plans the reversal; the repository applies it in one
//! transaction.

use super::error::SeriesError;
use super::types::{Anticipation, ReversalPlan, SeriesEntry};

/// Stateless planner for anticipation cancellation.
pub struct ReversalService;

impl ReversalService {
    /// Plans the cancellation of `anticipation`.
    ///
    /// `covered` holds the entries currently linked to the anticipation.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySettled` if the consolidated entry has been settled,
    /// and `Internal` if `consolidated` is not the anticipation's entry.
    pub fn plan(
        anticipation: &Anticipation,
        consolidated: &SeriesEntry,
        covered: &[SeriesEntry],
    ) -> Result<ReversalPlan, SeriesError> {
        if consolidated.id != anticipation.entry_id {
            return Err(SeriesError::Internal(format!(
                "Entry {} is not the consolidated entry of anticipation {}",
                consolidated.id, anticipation.id
            )));
        }
        if consolidated.settlement.is_settled() {
            return Err(SeriesError::AlreadySettled(anticipation.id));
        }

        let mut restored: Vec<&SeriesEntry> = covered
            .iter()
            .filter(|e| e.covered_by_anticipation_id == Some(anticipation.id))
            .collect();
        restored.sort_by_key(|e| e.position());

        Ok(ReversalPlan {
            anticipation_id: anticipation.id,
            consolidated_entry_id: consolidated.id,
            restored: restored.into_iter().map(|e| e.id).collect(),
        })
    }

    /// Returns `entry` as it looks once the reversal is applied.
    #[cfg(test)]
    #[must_use]
    pub fn restore(entry: &SeriesEntry) -> SeriesEntry {
        SeriesEntry {
            is_anticipated: false,
            covered_by_anticipation_id: None,
            ..entry.clone()
        }
    }
}
