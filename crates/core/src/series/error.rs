//! Series error types.
//!
//! Three families: validation errors are rejected before any write,
//! consistency errors are detected at the transaction boundary and may be
//! retried after a refresh, and not-found errors are terminal.

use rust_decimal::Decimal;
use thiserror::Error;

use hearth_shared::AppError;
use hearth_shared::types::{AnticipationId, EntryId, SeriesId};

use super::types::Condition;

/// Errors that can occur during series operations.
#[derive(Debug, Error)]
pub enum SeriesError {
    // ========== Validation Errors ==========
    /// Installment count outside 2..=24.
    #[error("Installment count must be between 2 and 24, got {0}")]
    InvalidInstallmentCount(u32),

    /// Recurrence count outside 2..=47.
    #[error("Recurrence count must be between 2 and 47, got {0}")]
    InvalidRecurrenceCount(u32),

    /// A count was supplied for a condition that does not take it.
    #[error("{field} is not accepted for {condition:?} entries")]
    UnexpectedCount {
        /// The offending field.
        field: &'static str,
        /// The template condition.
        condition: Condition,
    },

    /// Entry amount cannot be negative.
    #[error("Entry amount cannot be negative")]
    NegativeAmount,

    /// Amounts are kept to the cent.
    #[error("Amount {0} has more than 2 decimal places")]
    InvalidAmountScale(Decimal),

    /// The series would run past the last representable period (9999-12).
    #[error("Series starting {start} with {count} entries runs past 9999-12")]
    PeriodOutOfRange {
        /// Period of the first entry.
        start: String,
        /// Number of entries requested.
        count: u32,
    },

    /// Anticipation selection is empty.
    #[error("At least one installment must be selected")]
    EmptySelection,

    /// Anticipation period is not a valid `YYYY-MM`.
    #[error("Invalid anticipation period: {0}")]
    InvalidPeriod(String),

    /// Discount cannot be negative.
    #[error("Discount cannot be negative")]
    NegativeDiscount,

    /// Discount is larger than the amount being anticipated.
    #[error("Discount {discount} exceeds anticipated total {total}")]
    DiscountExceedsTotal {
        /// Requested discount.
        discount: Decimal,
        /// Sum of the selected installments.
        total: Decimal,
    },

    /// Bulk edit without any field to change.
    #[error("Patch does not change any field")]
    EmptyPatch,

    // ========== Consistency Errors ==========
    /// A selected entry is no longer eligible for anticipation.
    #[error("Entry {0} is no longer eligible for anticipation, refresh and try again")]
    StaleEligibility(EntryId),

    /// The consolidated entry is settled; the anticipation is historical.
    #[error("Anticipation {0} is already settled and cannot be cancelled")]
    AlreadySettled(AnticipationId),

    /// The entry takes part in an anticipation and cannot be changed this way.
    #[error("Entry {0} is linked to an anticipation, cancel the anticipation first")]
    AnticipationLinked(EntryId),

    /// The entry is settled implicitly (e.g. by a card invoice).
    #[error("Settlement does not apply to entry {0}")]
    SettlementNotApplicable(EntryId),

    // ========== Not Found Errors ==========
    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Series not found.
    #[error("Series not found: {0}")]
    SeriesNotFound(SeriesId),

    /// Anticipation not found.
    #[error("Anticipation not found: {0}")]
    AnticipationNotFound(AnticipationId),

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SeriesError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInstallmentCount(_) => "INVALID_INSTALLMENT_COUNT",
            Self::InvalidRecurrenceCount(_) => "INVALID_RECURRENCE_COUNT",
            Self::UnexpectedCount { .. } => "UNEXPECTED_COUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidAmountScale(_) => "INVALID_AMOUNT_SCALE",
            Self::PeriodOutOfRange { .. } => "PERIOD_OUT_OF_RANGE",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::NegativeDiscount => "NEGATIVE_DISCOUNT",
            Self::DiscountExceedsTotal { .. } => "DISCOUNT_EXCEEDS_TOTAL",
            Self::EmptyPatch => "EMPTY_PATCH",
            Self::StaleEligibility(_) => "STALE_ELIGIBILITY",
            Self::AlreadySettled(_) => "ALREADY_SETTLED",
            Self::AnticipationLinked(_) => "ANTICIPATION_LINKED",
            Self::SettlementNotApplicable(_) => "SETTLEMENT_NOT_APPLICABLE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::SeriesNotFound(_) => "SERIES_NOT_FOUND",
            Self::AnticipationNotFound(_) => "ANTICIPATION_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidInstallmentCount(_)
            | Self::InvalidRecurrenceCount(_)
            | Self::UnexpectedCount { .. }
            | Self::NegativeAmount
            | Self::InvalidAmountScale(_)
            | Self::PeriodOutOfRange { .. }
            | Self::EmptySelection
            | Self::InvalidPeriod(_)
            | Self::NegativeDiscount
            | Self::DiscountExceedsTotal { .. }
            | Self::EmptyPatch
            | Self::SettlementNotApplicable(_) => 400,

            // 404 Not Found
            Self::EntryNotFound(_) | Self::SeriesNotFound(_) | Self::AnticipationNotFound(_) => {
                404
            }

            // 409 Conflict - consistency errors
            Self::StaleEligibility(_) | Self::AlreadySettled(_) | Self::AnticipationLinked(_) => {
                409
            }

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true for consistency errors surfaced as "refresh and try again".
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleEligibility(_) | Self::AlreadySettled(_))
    }
}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => match err {
                SeriesError::Database(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}
