//! Anticipation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use hearth_core::series::{AnticipationRequest, today};
use hearth_db::AnticipationRepository;
use hearth_shared::types::{AnticipationId, CategoryId, EntryId, PayerId, SeriesId, UserId};

use super::error_response;
use crate::AppState;

/// Creates the anticipation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/series/{series_id}/anticipations",
            get(list_anticipations).post(create_anticipation),
        )
        .route(
            "/users/{user_id}/anticipations/{anticipation_id}",
            get(get_anticipation).delete(cancel_anticipation),
        )
}

/// Request body for anticipating installments.
#[derive(Debug, Deserialize)]
pub struct CreateAnticipationRequest {
    /// Entries chosen from the eligible set.
    pub entry_ids: Vec<EntryId>,
    /// Booking period of the consolidated entry (YYYY-MM).
    pub anticipation_period: String,
    /// Discount for paying early.
    #[serde(default)]
    pub discount: Decimal,
    /// Date of the anticipation; defaults to today.
    pub anticipation_date: Option<NaiveDate>,
    /// Payer override.
    pub payer_id: Option<PayerId>,
    /// Category override.
    pub category_id: Option<CategoryId>,
    /// Note override.
    pub note: Option<String>,
}

/// GET `/users/{user_id}/series/{series_id}/anticipations` - History,
/// newest first.
async fn list_anticipations(
    State(state): State<AppState>,
    Path((user_id, series_id)): Path<(UserId, SeriesId)>,
) -> Response {
    let repo = AnticipationRepository::new((*state.db).clone());

    match repo.list_anticipations(user_id, series_id).await {
        Ok(anticipations) => (
            StatusCode::OK,
            Json(json!({ "anticipations": anticipations })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/users/{user_id}/series/{series_id}/anticipations` - Anticipate
/// installments into one consolidated entry.
async fn create_anticipation(
    State(state): State<AppState>,
    Path((user_id, series_id)): Path<(UserId, SeriesId)>,
    Json(payload): Json<CreateAnticipationRequest>,
) -> Response {
    let repo = AnticipationRepository::new((*state.db).clone());

    let request = AnticipationRequest {
        user_id,
        series_id,
        entry_ids: payload.entry_ids,
        anticipation_period: payload.anticipation_period,
        discount: payload.discount,
        anticipation_date: payload.anticipation_date.unwrap_or_else(today),
        payer_id: payload.payer_id,
        category_id: payload.category_id,
        note: payload.note,
    };

    match repo.create_anticipation(&request).await {
        Ok(plan) => (
            StatusCode::CREATED,
            Json(json!({
                "anticipation": plan.anticipation,
                "consolidated_entry": plan.consolidated,
                "covered": plan.covered,
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/users/{user_id}/anticipations/{anticipation_id}` - Fetch one
/// anticipation.
async fn get_anticipation(
    State(state): State<AppState>,
    Path((user_id, anticipation_id)): Path<(UserId, AnticipationId)>,
) -> Response {
    let repo = AnticipationRepository::new((*state.db).clone());

    match repo.get_anticipation(user_id, anticipation_id).await {
        Ok(anticipation) => (StatusCode::OK, Json(anticipation)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE `/users/{user_id}/anticipations/{anticipation_id}` - Cancel an
/// unsettled anticipation and restore the installments it covered.
async fn cancel_anticipation(
    State(state): State<AppState>,
    Path((user_id, anticipation_id)): Path<(UserId, AnticipationId)>,
) -> Response {
    let repo = AnticipationRepository::new((*state.db).clone());

    match repo.cancel_anticipation(user_id, anticipation_id).await {
        Ok(reversal) => (
            StatusCode::OK,
            Json(json!({
                "anticipation_id": reversal.anticipation_id,
                "consolidated_entry_id": reversal.consolidated_entry_id,
                "restored": reversal.restored,
            })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
