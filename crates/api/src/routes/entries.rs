//! Entry routes: creation, scoped bulk edit/delete and settlement.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use hearth_core::series::{
    Condition, EntryPatch, EntryTemplate, PaymentMethod, Scope, TransactionType,
};
use hearth_db::EntryRepository;
use hearth_shared::types::{AccountId, CardId, CategoryId, EntryId, PayerId, UserId};

use super::{error_response, nullable};
use crate::AppState;

/// Creates the entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/entries", post(create_entries))
        .route(
            "/users/{user_id}/entries/{entry_id}",
            get(get_entry).patch(bulk_edit).delete(bulk_delete),
        )
        .route("/users/{user_id}/entries/{entry_id}/scope", get(resolve_scope))
        .route(
            "/users/{user_id}/entries/{entry_id}/settlement",
            post(toggle_settlement),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating an entry or a series.
#[derive(Debug, Deserialize)]
pub struct CreateEntriesRequest {
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// `one_off`, `installment` or `recurring`.
    pub condition: Condition,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Description.
    pub description: String,
    /// Purchase total for installments, per-occurrence amount otherwise.
    pub amount: Decimal,
    /// Purchase date (YYYY-MM-DD).
    pub purchase_date: NaiveDate,
    /// First due date.
    pub due_date: Option<NaiveDate>,
    /// Number of installments.
    pub installment_count: Option<u32>,
    /// Number of recurrences; omit for open-ended.
    pub recurrence_count: Option<u32>,
    /// Create a one-off entry already settled.
    #[serde(default)]
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

impl CreateEntriesRequest {
    fn into_template(self, user_id: UserId) -> EntryTemplate {
        EntryTemplate {
            user_id,
            transaction_type: self.transaction_type,
            condition: self.condition,
            payment_method: self.payment_method,
            description: self.description,
            amount: self.amount,
            purchase_date: self.purchase_date,
            due_date: self.due_date,
            installment_count: self.installment_count,
            recurrence_count: self.recurrence_count,
            settled: self.settled,
            payer_id: self.payer_id,
            account_id: self.account_id,
            card_id: self.card_id,
            category_id: self.category_id,
            note: self.note,
        }
    }
}

/// Scope query parameter for bulk operations.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    /// `current`, `future` or `all`.
    pub scope: Scope,
}

/// Request body for a bulk edit. Absent fields are left untouched and
/// `null` clears an optional field.
#[derive(Debug, Default, Deserialize)]
pub struct BulkEditRequest {
    /// New description.
    pub description: Option<String>,
    /// New per-entry amount.
    pub amount: Option<Decimal>,
    /// New note.
    #[serde(default, deserialize_with = "nullable")]
    pub note: Option<Option<String>>,
    /// New category.
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<CategoryId>>,
    /// New payer.
    #[serde(default, deserialize_with = "nullable")]
    pub payer_id: Option<Option<PayerId>>,
    /// New due date.
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl From<BulkEditRequest> for EntryPatch {
    fn from(req: BulkEditRequest) -> Self {
        Self {
            description: req.description,
            amount: req.amount,
            note: req.note,
            category_id: req.category_id,
            payer_id: req.payer_id,
            due_date: req.due_date,
        }
    }
}

/// Request body for settling or unsettling an entry.
#[derive(Debug, Deserialize)]
pub struct SettlementRequest {
    /// Target state.
    pub settled: bool,
    /// Settlement date; defaults to today.
    pub settlement_date: Option<NaiveDate>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/users/{user_id}/entries` - Create a one-off entry or a whole series.
async fn create_entries(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<CreateEntriesRequest>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());

    match repo.create_entries(&payload.into_template(user_id)).await {
        Ok(entries) => (StatusCode::CREATED, Json(json!({ "entries": entries }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/users/{user_id}/entries/{entry_id}` - Fetch one entry.
async fn get_entry(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(UserId, EntryId)>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());

    match repo.get_entry(user_id, entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/users/{user_id}/entries/{entry_id}/scope?scope=` - Preview the
/// entries a bulk operation would touch.
async fn resolve_scope(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(UserId, EntryId)>,
    Query(query): Query<ScopeQuery>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());

    let available = match repo.available_scopes(user_id, entry_id).await {
        Ok(scopes) => scopes,
        Err(e) => return error_response(&e),
    };

    match repo.resolve_bulk_scope(user_id, entry_id, query.scope).await {
        Ok(ids) => (
            StatusCode::OK,
            Json(json!({ "entry_ids": ids, "available_scopes": available })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// PATCH `/users/{user_id}/entries/{entry_id}?scope=` - Bulk edit.
async fn bulk_edit(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(UserId, EntryId)>,
    Query(query): Query<ScopeQuery>,
    Json(payload): Json<BulkEditRequest>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());
    let patch = EntryPatch::from(payload);

    match repo
        .apply_bulk_edit(user_id, entry_id, query.scope, &patch)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE `/users/{user_id}/entries/{entry_id}?scope=` - Bulk delete.
async fn bulk_delete(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(UserId, EntryId)>,
    Query(query): Query<ScopeQuery>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());

    match repo.apply_bulk_delete(user_id, entry_id, query.scope).await {
        Ok(deleted) => (StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/users/{user_id}/entries/{entry_id}/settlement` - Settle or
/// unsettle an entry.
async fn toggle_settlement(
    State(state): State<AppState>,
    Path((user_id, entry_id)): Path<(UserId, EntryId)>,
    Json(payload): Json<SettlementRequest>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());
    match repo
        .toggle_settlement(user_id, entry_id, payload.settled, payload.settlement_date)
        .await
    {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => error_response(&e),
    }
}
