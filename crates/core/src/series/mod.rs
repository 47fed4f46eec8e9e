//! Transaction series management for Hearth.
//!
//! This module implements installment and recurring series: expanding a
//! template into entries, resolving the scope of bulk operations, and
//! anticipating (and un-anticipating) future installments.
//!
//! # Modules
//!
//! - `types` - Series domain types (SeriesEntry, Settlement, Scope)
//! - `error` - Series-specific error types
//! - `expander` - Template expansion and installment splitting
//! - `scope` - Scope resolution for bulk edit/delete
//! - `eligibility` - Which entries may still be anticipated
//! - `anticipation` - Anticipation planning
//! - `reversal` - Anticipation cancellation planning
//! - `settlement` - Per-entry settlement toggling

pub mod anticipation;
pub mod eligibility;
pub mod error;
pub mod expander;
pub mod reversal;
pub mod scope;
pub mod settlement;
pub mod types;

#[cfg(test)]
mod anticipation_props;
#[cfg(test)]
mod expander_props;
#[cfg(test)]
mod scope_props;

pub use anticipation::{AnticipationService, apply_discount, today};
pub use eligibility::EligibilitySelector;
pub use error::SeriesError;
pub use expander::{
    DEFAULT_RECURRENCE_HORIZON, MAX_INSTALLMENTS, MAX_RECURRENCES, MIN_SERIES_LENGTH,
    SeriesExpander, check_amount, split_amount,
};
pub use reversal::ReversalService;
pub use scope::ScopeResolver;
pub use settlement::SettlementService;
pub use types::{
    Anticipation, AnticipationPlan, AnticipationRequest, Condition, EntryPatch, EntryTemplate,
    PaymentMethod, ReversalPlan, Scope, SeriesEntry, Settlement, TransactionType,
};
