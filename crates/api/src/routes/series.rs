//! Series read routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use hearth_db::{AnticipationRepository, EntryRepository};
use hearth_shared::types::{SeriesId, UserId};

use super::error_response;
use crate::AppState;

/// Creates the series routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/series/{series_id}", get(list_series))
        .route(
            "/users/{user_id}/series/{series_id}/eligible",
            get(list_eligible),
        )
}

/// GET `/users/{user_id}/series/{series_id}` - Every entry of a series.
async fn list_series(
    State(state): State<AppState>,
    Path((user_id, series_id)): Path<(UserId, SeriesId)>,
) -> Response {
    let repo = EntryRepository::new((*state.db).clone());

    match repo.list_series(user_id, series_id).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/users/{user_id}/series/{series_id}/eligible` - Entries that can
/// still be anticipated.
async fn list_eligible(
    State(state): State<AppState>,
    Path((user_id, series_id)): Path<(UserId, SeriesId)>,
) -> Response {
    let repo = AnticipationRepository::new((*state.db).clone());

    match repo.list_eligible(user_id, series_id).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(e) => error_response(&e),
    }
}
