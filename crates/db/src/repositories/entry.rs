//! Entry repository: series creation, reads, scoped bulk edit/delete and
//! settlement toggling.
//!
//! Every mutation runs in one database transaction. Rows are re-read inside
//! the transaction with an exclusive lock before the core services decide,
//! and the write itself is guarded by the same predicate the decision used.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use hearth_core::series::{
    EntryPatch, EntryTemplate, Scope, ScopeResolver, SeriesEntry, SeriesError, SeriesExpander,
    Settlement, SettlementService, today,
};
use hearth_shared::types::{CategoryId, EntryId, PayerId, SeriesId, UserId};

use crate::entities::{sea_orm_active_enums::SettlementStatus, transaction_entries};

use super::mapping::{
    core_settlement_to_db, entries_from_models, entry_from_model, entry_to_active,
};

/// Loads one entry owned by `user_id`, optionally locking the row.
pub(crate) async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    entry_id: EntryId,
    lock: bool,
) -> Result<SeriesEntry, SeriesError> {
    let mut query = transaction_entries::Entity::find_by_id(entry_id.into_inner())
        .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await
        .map_err(|e| SeriesError::Database(e.to_string()))?
        .ok_or(SeriesError::EntryNotFound(entry_id))?;
    entry_from_model(model)
}

/// Loads every entry of a series owned by `user_id`, ordered by position.
///
/// Returns an empty vector for an unknown series; callers decide whether
/// that is an error.
pub(crate) async fn load_series<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    series_id: SeriesId,
    lock: bool,
) -> Result<Vec<SeriesEntry>, SeriesError> {
    let mut query = transaction_entries::Entity::find()
        .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
        .filter(transaction_entries::Column::SeriesId.eq(series_id.into_inner()))
        .order_by_asc(transaction_entries::Column::CurrentInstallment);
    if lock {
        query = query.lock_exclusive();
    }
    let models = query
        .all(conn)
        .await
        .map_err(|e| SeriesError::Database(e.to_string()))?;
    entries_from_models(models)
}

/// Resolves a scope against stored state and returns the targeted entries.
///
/// Lock order: series rows in position order, the same order anticipations
/// take them. The reference is read unlocked only to learn its series and
/// is then re-found inside the locked set.
async fn load_targets<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    entry_id: EntryId,
    scope: Scope,
    lock: bool,
) -> Result<Vec<SeriesEntry>, SeriesError> {
    let reference = load_entry(conn, user_id, entry_id, false).await?;
    let Some(series_id) = reference.series_id else {
        if lock {
            return Ok(vec![load_entry(conn, user_id, entry_id, true).await?]);
        }
        return Ok(vec![reference]);
    };

    let series = load_series(conn, user_id, series_id, lock).await?;
    let reference = series
        .iter()
        .find(|e| e.id == entry_id)
        .cloned()
        .ok_or(SeriesError::EntryNotFound(entry_id))?;

    let ids = ScopeResolver::resolve(&reference, &series, scope);
    Ok(series.into_iter().filter(|e| ids.contains(&e.id)).collect())
}

fn target_ids(targets: &[SeriesEntry]) -> Vec<Uuid> {
    targets.iter().map(|e| e.id.into_inner()).collect()
}

/// Entry repository.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    db: DatabaseConnection,
}

impl EntryRepository {
    /// Creates a new entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Expands `template` and stores every resulting entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error from the expander (nothing is written) or a
    /// database error.
    pub async fn create_entries(
        &self,
        template: &EntryTemplate,
    ) -> Result<Vec<SeriesEntry>, SeriesError> {
        let entries = SeriesExpander::expand(template)?;

        let now = Utc::now().into();
        let models = entries
            .iter()
            .map(|e| entry_to_active(e, now))
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        transaction_entries::Entity::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            user_id = %template.user_id,
            series_id = ?entries[0].series_id,
            condition = ?template.condition,
            count = entries.len(),
            "Created entries"
        );

        Ok(entries)
    }

    /// Fetches one entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist for this user.
    pub async fn get_entry(
        &self,
        user_id: UserId,
        entry_id: EntryId,
    ) -> Result<SeriesEntry, SeriesError> {
        load_entry(&self.db, user_id, entry_id, false).await
    }

    /// Lists every entry of a series ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `SeriesNotFound` if the series has no entries for this user.
    pub async fn list_series(
        &self,
        user_id: UserId,
        series_id: SeriesId,
    ) -> Result<Vec<SeriesEntry>, SeriesError> {
        let entries = load_series(&self.db, user_id, series_id, false).await?;
        if entries.is_empty() {
            return Err(SeriesError::SeriesNotFound(series_id));
        }
        Ok(entries)
    }

    /// Resolves which entries a bulk operation on `entry_id` would touch.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the reference entry does not exist.
    pub async fn resolve_bulk_scope(
        &self,
        user_id: UserId,
        entry_id: EntryId,
        scope: Scope,
    ) -> Result<Vec<EntryId>, SeriesError> {
        let targets = load_targets(&self.db, user_id, entry_id, scope, false).await?;
        Ok(targets.into_iter().map(|e| e.id).collect())
    }

    /// Lists the scopes a bulk operation on `entry_id` can use.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist.
    pub async fn available_scopes(
        &self,
        user_id: UserId,
        entry_id: EntryId,
    ) -> Result<Vec<Scope>, SeriesError> {
        let entry = load_entry(&self.db, user_id, entry_id, false).await?;
        Ok(ScopeResolver::available_scopes(&entry))
    }

    /// Applies `patch` to every entry in the scope of `entry_id`.
    ///
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, a patch validation error, or
    /// `AnticipationLinked` when the amount changes on an anticipated entry.
    pub async fn apply_bulk_edit(
        &self,
        user_id: UserId,
        entry_id: EntryId,
        scope: Scope,
        patch: &EntryPatch,
    ) -> Result<u64, SeriesError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let targets = load_targets(&txn, user_id, entry_id, scope, true).await?;
        ScopeResolver::check_edit(patch, &targets)?;

        let mut update = transaction_entries::Entity::update_many()
            .col_expr(
                transaction_entries::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            );
        if let Some(description) = &patch.description {
            update = update.col_expr(
                transaction_entries::Column::Description,
                Expr::value(description.clone()),
            );
        }
        if let Some(amount) = patch.amount {
            update = update.col_expr(transaction_entries::Column::Amount, Expr::value(amount));
        }
        if let Some(note) = &patch.note {
            update = update.col_expr(transaction_entries::Column::Note, Expr::value(note.clone()));
        }
        if let Some(category_id) = patch.category_id {
            update = update.col_expr(
                transaction_entries::Column::CategoryId,
                Expr::value(category_id.map(CategoryId::into_inner)),
            );
        }
        if let Some(payer_id) = patch.payer_id {
            update = update.col_expr(
                transaction_entries::Column::PayerId,
                Expr::value(payer_id.map(PayerId::into_inner)),
            );
        }
        if let Some(due_date) = patch.due_date {
            update = update.col_expr(transaction_entries::Column::DueDate, Expr::value(due_date));
        }

        let mut filtered = update
            .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_entries::Column::Id.is_in(target_ids(&targets)));
        if patch.amount.is_some() {
            // Must match the anticipation check above
            filtered = filtered
                .filter(transaction_entries::Column::IsAnticipated.eq(false))
                .filter(transaction_entries::Column::AnticipationId.is_null());
        }
        let result = filtered
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            user_id = %user_id,
            entry_id = %entry_id,
            scope = ?scope,
            rows = result.rows_affected,
            "Applied bulk edit"
        );

        Ok(result.rows_affected)
    }

    /// Deletes every entry in the scope of `entry_id`.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, or `AnticipationLinked` if any target takes
    /// part in an anticipation.
    pub async fn apply_bulk_delete(
        &self,
        user_id: UserId,
        entry_id: EntryId,
        scope: Scope,
    ) -> Result<u64, SeriesError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let targets = load_targets(&txn, user_id, entry_id, scope, true).await?;
        if let Err(e) = ScopeResolver::check_delete(&targets) {
            tracing::warn!(entry_id = %entry_id, scope = ?scope, error = %e, "Bulk delete refused");
            return Err(e);
        }

        let result = transaction_entries::Entity::delete_many()
            .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_entries::Column::Id.is_in(target_ids(&targets)))
            .filter(transaction_entries::Column::IsAnticipated.eq(false))
            .filter(transaction_entries::Column::AnticipationId.is_null())
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            user_id = %user_id,
            entry_id = %entry_id,
            scope = ?scope,
            rows = result.rows_affected,
            "Applied bulk delete"
        );

        Ok(result.rows_affected)
    }

    /// Marks an entry as settled or unsettled.
    ///
    /// `date` defaults to today when settling and is ignored when unsettling.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `AnticipationLinked`, `SettlementNotApplicable`,
    /// or `StaleEligibility` if an anticipation covered the entry first.
    pub async fn toggle_settlement(
        &self,
        user_id: UserId,
        entry_id: EntryId,
        settled: bool,
        date: Option<NaiveDate>,
    ) -> Result<SeriesEntry, SeriesError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let entry = load_entry(&txn, user_id, entry_id, true).await?;
        let (settlement, settlement_date) =
            SettlementService::toggle(&entry, settled, date.unwrap_or_else(today))?;

        let result = transaction_entries::Entity::update_many()
            .col_expr(
                transaction_entries::Column::Settlement,
                Expr::value(core_settlement_to_db(settlement)),
            )
            .col_expr(
                transaction_entries::Column::SettlementDate,
                Expr::value(settlement_date),
            )
            .col_expr(
                transaction_entries::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(transaction_entries::Column::Id.eq(entry_id.into_inner()))
            .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_entries::Column::IsAnticipated.eq(false))
            .filter(transaction_entries::Column::Settlement.ne(SettlementStatus::NotApplicable))
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            tracing::warn!(entry_id = %entry_id, "Settlement toggle lost a race");
            return Err(SeriesError::StaleEligibility(entry_id));
        }

        let updated = load_entry(&txn, user_id, entry_id, false).await?;
        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            entry_id = %entry_id,
            settled = settlement == Settlement::Settled,
            "Toggled settlement"
        );

        Ok(updated)
    }
}
