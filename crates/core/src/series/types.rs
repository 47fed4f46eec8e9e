//! Series domain types.
//!
//! A series is never materialised as a parent object: it is the set of
//! entries sharing a `series_id`, ordered by `current_installment`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hearth_shared::types::{
    AccountId, AnticipationId, CardId, CategoryId, EntryId, PayerId, Period, SeriesId, UserId,
};

/// Direction of an entry. Amounts are magnitudes; the type carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money going out.
    Expense,
    /// Money coming in.
    Income,
    /// Movement between the user's own accounts.
    Transfer,
}

/// How an entry was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// A single standalone entry.
    OneOff,
    /// Part of a purchase split over a fixed number of months.
    Installment,
    /// Part of a charge repeating every month.
    Recurring,
}

impl Condition {
    /// Returns true if entries with this condition belong to a series.
    #[must_use]
    pub fn is_series(&self) -> bool {
        !matches!(self, Self::OneOff)
    }
}

/// Payment method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Debit card.
    DebitCard,
    /// Credit card; settled implicitly by the card invoice.
    CreditCard,
    /// Bank transfer.
    BankTransfer,
    /// Bank slip paid by its due date.
    BankSlip,
}

impl PaymentMethod {
    /// Returns true if entries paid this way are settled by an invoice
    /// rather than individually.
    #[must_use]
    pub fn settles_by_invoice(&self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

/// Settlement state of an entry.
///
/// Replaces a nullable boolean: `NotApplicable` entries (credit card) can
/// never be toggled and are never treated as settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Paid or received.
    Settled,
    /// Still open.
    Unsettled,
    /// Settled implicitly elsewhere (e.g. by a card invoice).
    NotApplicable,
}

impl Settlement {
    /// Initial state for a new entry paid with `method`.
    #[must_use]
    pub fn initial_for(method: PaymentMethod) -> Self {
        if method.settles_by_invoice() {
            Self::NotApplicable
        } else {
            Self::Unsettled
        }
    }

    /// Returns true only for `Settled`.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled)
    }
}

/// Breadth of a bulk edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The reference entry only.
    Current,
    /// The reference entry and every later one in its series.
    Future,
    /// Every entry of the series.
    All,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "future" => Ok(Self::Future),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown scope: {s}")),
        }
    }
}

/// A single transaction entry as seen by the series engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Entry ID.
    pub id: EntryId,
    /// Owner.
    pub user_id: UserId,
    /// Series this entry belongs to, if any.
    pub series_id: Option<SeriesId>,
    /// Direction.
    pub transaction_type: TransactionType,
    /// Creation condition.
    pub condition: Condition,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Description.
    pub description: String,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// Date of purchase.
    pub purchase_date: NaiveDate,
    /// Booking period.
    pub period: Period,
    /// Due date for deferred payment methods.
    pub due_date: Option<NaiveDate>,
    /// Date the entry was settled.
    pub settlement_date: Option<NaiveDate>,
    /// 1-based position in the series.
    pub current_installment: Option<u32>,
    /// Series length; `None` for one-off entries and open-ended recurrences.
    pub installment_count: Option<u32>,
    /// Settlement state.
    pub settlement: Settlement,
    /// True while an anticipation covers this entry.
    pub is_anticipated: bool,
    /// Set on consolidated entries: the anticipation that produced them.
    pub anticipation_id: Option<AnticipationId>,
    /// Set on covered originals: the anticipation covering them.
    pub covered_by_anticipation_id: Option<AnticipationId>,
    /// Payer.
    pub payer_id: Option<PayerId>,
    /// Bank account.
    pub account_id: Option<AccountId>,
    /// Credit card.
    pub card_id: Option<CardId>,
    /// Category.
    pub category_id: Option<CategoryId>,
    /// Free-form note.
    pub note: Option<String>,
}

impl SeriesEntry {
    /// Position used to order entries inside a series.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.current_installment.unwrap_or(0)
    }

    /// Returns true if the entry can be selected for anticipation.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.settlement.is_settled() && !self.is_anticipated
    }

    /// Returns true if the entry takes part in an anticipation, either as a
    /// covered original or as the consolidated settlement entry.
    #[must_use]
    pub fn is_anticipation_linked(&self) -> bool {
        self.is_anticipated
            || self.covered_by_anticipation_id.is_some()
            || self.anticipation_id.is_some()
    }
}

/// Template from which one entry or a whole series is created.
#[derive(Debug, Clone)]
pub struct EntryTemplate {
    /// Owner.
    pub user_id: UserId,
    /// Direction.
    pub transaction_type: TransactionType,
    /// One-off, installment or recurring.
    pub condition: Condition,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Description.
    pub description: String,
    /// Purchase total for installments, per-occurrence amount otherwise.
    pub amount: Decimal,
    /// Date of purchase; its month is the first period.
    pub purchase_date: NaiveDate,
    /// First due date, advanced one month per step.
    pub due_date: Option<NaiveDate>,
    /// Number of installments (installment condition only).
    pub installment_count: Option<u32>,
    /// Number of occurrences (recurring only); `None` is open-ended.
    pub recurrence_count: Option<u32>,
    /// Create the entry already settled. Honoured for one-off entries only.
    pub settled: bool,
    /// Payer.
    pub payer_id: Option<PayerId>,
    /// Bank account.
    pub account_id: Option<AccountId>,
    /// Credit card.
    pub card_id: Option<CardId>,
    /// Category.
    pub category_id: Option<CategoryId>,
    /// Note.
    pub note: Option<String>,
}

/// Field-level patch applied by a bulk edit.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    /// New description.
    pub description: Option<String>,
    /// New per-entry amount.
    pub amount: Option<Decimal>,
    /// New note.
    pub note: Option<Option<String>>,
    /// New category.
    pub category_id: Option<Option<CategoryId>>,
    /// New payer.
    pub payer_id: Option<Option<PayerId>>,
    /// New due date.
    pub due_date: Option<Option<NaiveDate>>,
}

impl EntryPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A recorded anticipation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anticipation {
    /// Anticipation ID.
    pub id: AnticipationId,
    /// Owner.
    pub user_id: UserId,
    /// Series the covered entries belong to.
    pub series_id: SeriesId,
    /// Consolidated settlement entry.
    pub entry_id: EntryId,
    /// Number of covered entries.
    pub installment_count: u32,
    /// Sum of the covered amounts before discount.
    pub total_amount: Decimal,
    /// Discount granted for paying early.
    pub discount: Decimal,
    /// Date the anticipation was made.
    pub anticipation_date: NaiveDate,
    /// Period the consolidated entry is booked to.
    pub anticipation_period: Period,
    /// Payer override.
    pub payer_id: Option<PayerId>,
    /// Category override.
    pub category_id: Option<CategoryId>,
    /// Note override.
    pub note: Option<String>,
}

/// Request to anticipate a subset of a series.
#[derive(Debug, Clone)]
pub struct AnticipationRequest {
    /// Requesting user.
    pub user_id: UserId,
    /// Target series.
    pub series_id: SeriesId,
    /// Entries chosen from the eligible set.
    pub entry_ids: Vec<EntryId>,
    /// Target booking period as typed by the user (`YYYY-MM`).
    pub anticipation_period: String,
    /// Discount, non-negative.
    pub discount: Decimal,
    /// Date of the anticipation.
    pub anticipation_date: NaiveDate,
    /// Payer override.
    pub payer_id: Option<PayerId>,
    /// Category override.
    pub category_id: Option<CategoryId>,
    /// Note override.
    pub note: Option<String>,
}

/// Everything an anticipation writes, computed before the write.
#[derive(Debug, Clone)]
pub struct AnticipationPlan {
    /// The anticipation row.
    pub anticipation: Anticipation,
    /// The consolidated settlement entry.
    pub consolidated: SeriesEntry,
    /// Entries to flag, ordered by position.
    pub covered: Vec<EntryId>,
}

/// Everything a reversal undoes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Anticipation to delete.
    pub anticipation_id: AnticipationId,
    /// Consolidated entry to delete.
    pub consolidated_entry_id: EntryId,
    /// Covered entries to restore, ordered by position.
    pub restored: Vec<EntryId>,
}
