//! Anticipation repository.
//!
//! Commits anticipation plans and reversals atomically. The consolidated
//! entry, the flags on the covered entries and the anticipation row are
//! written in one transaction, and the flags are set with a conditional
//! update so two overlapping anticipations cannot both succeed.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::Expr,
};

use hearth_core::series::{
    Anticipation, AnticipationPlan, AnticipationRequest, AnticipationService, EligibilitySelector,
    ReversalPlan, ReversalService, SeriesEntry, SeriesError,
};
use hearth_shared::types::{AnticipationId, EntryId, SeriesId, UserId};

use crate::entities::{
    installment_anticipations, sea_orm_active_enums::SettlementStatus, transaction_entries,
};

use super::entry::{load_entry, load_series};
use super::mapping::{
    anticipation_from_model, anticipation_to_active, entries_from_models, entry_to_active,
};

/// Anticipation repository.
#[derive(Debug, Clone)]
pub struct AnticipationRepository {
    db: DatabaseConnection,
}

impl AnticipationRepository {
    /// Creates a new anticipation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the entries of a series that can still be anticipated.
    ///
    /// # Errors
    ///
    /// Returns `SeriesNotFound` if the series has no entries for this user.
    pub async fn list_eligible(
        &self,
        user_id: UserId,
        series_id: SeriesId,
    ) -> Result<Vec<SeriesEntry>, SeriesError> {
        let series = load_series(&self.db, user_id, series_id, false).await?;
        if series.is_empty() {
            return Err(SeriesError::SeriesNotFound(series_id));
        }
        Ok(EligibilitySelector::select(&series)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Anticipates the requested entries.
    ///
    /// Validation that needs no stored state runs first. The series is then
    /// re-read under lock inside the write transaction, planned, and written.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection`, `InvalidPeriod`, `NegativeDiscount`,
    /// `SeriesNotFound`, `StaleEligibility` or `DiscountExceedsTotal`.
    pub async fn create_anticipation(
        &self,
        request: &AnticipationRequest,
    ) -> Result<AnticipationPlan, SeriesError> {
        AnticipationService::validate_request(request)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let series = load_series(&txn, request.user_id, request.series_id, true).await?;
        let plan = match AnticipationService::plan(request, &series) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(
                    series_id = %request.series_id,
                    error = %e,
                    "Anticipation refused"
                );
                return Err(e);
            }
        };

        // Dropping the transaction on error rolls back the consolidated entry
        Self::write_plan(&txn, &plan).await?;

        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            anticipation_id = %plan.anticipation.id,
            series_id = %plan.anticipation.series_id,
            installments = plan.anticipation.installment_count,
            total = %plan.anticipation.total_amount,
            discount = %plan.anticipation.discount,
            "Created anticipation"
        );

        Ok(plan)
    }

    /// Writes `plan` inside `txn`: the consolidated entry, the flags on the
    /// covered entries and the anticipation row.
    ///
    /// The flags are only set on entries that are still eligible. If any
    /// covered entry changed since the plan was computed this returns
    /// `StaleEligibility` and the caller must drop `txn` uncommitted.
    pub(crate) async fn write_plan(
        txn: &DatabaseTransaction,
        plan: &AnticipationPlan,
    ) -> Result<(), SeriesError> {
        let now: DateTime<FixedOffset> = Utc::now().into();

        // (a) consolidated settlement entry
        entry_to_active(&plan.consolidated, now)?
            .insert(txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        // (b) flag the covered entries, only while they are still eligible
        let covered: Vec<uuid::Uuid> = plan.covered.iter().map(|id| id.into_inner()).collect();
        let result = transaction_entries::Entity::update_many()
            .col_expr(transaction_entries::Column::IsAnticipated, Expr::value(true))
            .col_expr(
                transaction_entries::Column::CoveredByAnticipationId,
                Expr::value(plan.anticipation.id.into_inner()),
            )
            .col_expr(transaction_entries::Column::UpdatedAt, Expr::value(now))
            .filter(transaction_entries::Column::UserId.eq(plan.anticipation.user_id.into_inner()))
            .filter(transaction_entries::Column::Id.is_in(covered.clone()))
            .filter(transaction_entries::Column::IsAnticipated.eq(false))
            .filter(transaction_entries::Column::Settlement.ne(SettlementStatus::Settled))
            .exec(txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        if result.rows_affected != covered.len() as u64 {
            let stale = Self::first_unflagged(txn, plan)
                .await?
                .unwrap_or(plan.covered[0]);
            tracing::warn!(
                series_id = %plan.anticipation.series_id,
                entry_id = %stale,
                expected = covered.len(),
                flagged = result.rows_affected,
                "Anticipation lost a race"
            );
            return Err(SeriesError::StaleEligibility(stale));
        }

        // (c) the linking record
        anticipation_to_active(&plan.anticipation, now)?
            .insert(txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        Ok(())
    }

    /// Finds a covered entry the conditional update did not flag.
    async fn first_unflagged(
        txn: &DatabaseTransaction,
        plan: &AnticipationPlan,
    ) -> Result<Option<EntryId>, SeriesError> {
        let flagged_elsewhere = transaction_entries::Entity::find()
            .filter(
                transaction_entries::Column::Id
                    .is_in(plan.covered.iter().map(|id| id.into_inner())),
            )
            .filter(
                Condition::any()
                    .add(transaction_entries::Column::CoveredByAnticipationId.is_null())
                    .add(
                        transaction_entries::Column::CoveredByAnticipationId
                            .ne(plan.anticipation.id.into_inner()),
                    ),
            )
            .order_by_asc(transaction_entries::Column::CurrentInstallment)
            .one(txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        Ok(flagged_elsewhere.map(|m| EntryId::from_uuid(m.id)))
    }

    /// Cancels an anticipation, restoring the entries it covered.
    ///
    /// Returns the reversal that was applied; `restored` lists the entries
    /// that are eligible again.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationNotFound`, or `AlreadySettled` if the
    /// consolidated entry has been settled (nothing is changed).
    pub async fn cancel_anticipation(
        &self,
        user_id: UserId,
        anticipation_id: AnticipationId,
    ) -> Result<ReversalPlan, SeriesError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let model = installment_anticipations::Entity::find_by_id(anticipation_id.into_inner())
            .filter(installment_anticipations::Column::UserId.eq(user_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?
            .ok_or(SeriesError::AnticipationNotFound(anticipation_id))?;
        let anticipation = anticipation_from_model(model)?;

        let consolidated = match load_entry(&txn, user_id, anticipation.entry_id, true).await {
            Ok(entry) => entry,
            Err(SeriesError::EntryNotFound(id)) => {
                return Err(SeriesError::Internal(format!(
                    "Consolidated entry {id} of anticipation {anticipation_id} is missing"
                )));
            }
            Err(e) => return Err(e),
        };

        let covered = transaction_entries::Entity::find()
            .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
            .filter(
                transaction_entries::Column::CoveredByAnticipationId
                    .eq(anticipation_id.into_inner()),
            )
            .order_by_asc(transaction_entries::Column::CurrentInstallment)
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;
        let covered = entries_from_models(covered)?;

        let plan = match ReversalService::plan(&anticipation, &consolidated, &covered) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(anticipation_id = %anticipation_id, error = %e, "Reversal refused");
                return Err(e);
            }
        };

        installment_anticipations::Entity::delete_by_id(plan.anticipation_id.into_inner())
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        let now: DateTime<FixedOffset> = Utc::now().into();
        transaction_entries::Entity::update_many()
            .col_expr(transaction_entries::Column::IsAnticipated, Expr::value(false))
            .col_expr(
                transaction_entries::Column::CoveredByAnticipationId,
                Expr::value(Option::<uuid::Uuid>::None),
            )
            .col_expr(transaction_entries::Column::UpdatedAt, Expr::value(now))
            .filter(
                transaction_entries::Column::CoveredByAnticipationId
                    .eq(plan.anticipation_id.into_inner()),
            )
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        transaction_entries::Entity::delete_by_id(plan.consolidated_entry_id.into_inner())
            .exec(&txn)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;

        tracing::info!(
            anticipation_id = %anticipation_id,
            restored = plan.restored.len(),
            "Cancelled anticipation"
        );

        Ok(plan)
    }

    /// Lists the anticipations of a series, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SeriesNotFound` if the series has no entries for this user.
    pub async fn list_anticipations(
        &self,
        user_id: UserId,
        series_id: SeriesId,
    ) -> Result<Vec<Anticipation>, SeriesError> {
        let exists = transaction_entries::Entity::find()
            .filter(transaction_entries::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_entries::Column::SeriesId.eq(series_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?;
        if exists == 0 {
            return Err(SeriesError::SeriesNotFound(series_id));
        }

        installment_anticipations::Entity::find()
            .filter(installment_anticipations::Column::UserId.eq(user_id.into_inner()))
            .filter(installment_anticipations::Column::SeriesId.eq(series_id.into_inner()))
            .order_by_desc(installment_anticipations::Column::CreatedAt)
            .order_by_desc(installment_anticipations::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?
            .into_iter()
            .map(anticipation_from_model)
            .collect()
    }

    /// Fetches one anticipation.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationNotFound` if it does not exist for this user.
    pub async fn get_anticipation(
        &self,
        user_id: UserId,
        anticipation_id: AnticipationId,
    ) -> Result<Anticipation, SeriesError> {
        let model = installment_anticipations::Entity::find_by_id(anticipation_id.into_inner())
            .filter(installment_anticipations::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| SeriesError::Database(e.to_string()))?
            .ok_or(SeriesError::AnticipationNotFound(anticipation_id))?;
        anticipation_from_model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sea_orm::{ConnectOptions, Database};

    use hearth_core::series::{Condition, EntryTemplate, PaymentMethod, TransactionType};

    use crate::EntryRepository;
    use crate::migration::{Migrator, MigratorTrait};

    async fn setup() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn four_installments(entries: &EntryRepository, user_id: UserId) -> Vec<SeriesEntry> {
        entries
            .create_entries(&EntryTemplate {
                user_id,
                transaction_type: TransactionType::Expense,
                condition: Condition::Installment,
                payment_method: PaymentMethod::BankSlip,
                description: "Fridge".to_string(),
                amount: dec!(400),
                purchase_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                due_date: None,
                installment_count: Some(4),
                recurrence_count: None,
                settled: false,
                payer_id: None,
                account_id: None,
                card_id: None,
                category_id: None,
                note: None,
            })
            .await
            .unwrap()
    }

    fn request(entries: &[SeriesEntry]) -> AnticipationRequest {
        AnticipationRequest {
            user_id: entries[0].user_id,
            series_id: entries[0].series_id.unwrap(),
            entry_ids: entries.iter().map(|e| e.id).collect(),
            anticipation_period: "2024-03".to_string(),
            discount: dec!(0),
            anticipation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            payer_id: None,
            category_id: None,
            note: None,
        }
    }

    async fn plan_unlocked(db: &DatabaseConnection, entries: &[SeriesEntry]) -> AnticipationPlan {
        let request = request(entries);
        let series = load_series(db, request.user_id, request.series_id, false)
            .await
            .unwrap();
        AnticipationService::plan(&request, &series).unwrap()
    }

    #[tokio::test]
    async fn test_write_plan_after_entry_settled_is_stale() {
        let db = setup().await;
        let entries = EntryRepository::new(db.clone());
        let user_id = UserId::new();
        let series = four_installments(&entries, user_id).await;
        let series_id = series[0].series_id.unwrap();

        let plan = plan_unlocked(&db, &series[1..]).await;
        entries
            .toggle_settlement(user_id, series[2].id, true, None)
            .await
            .unwrap();

        let txn = db.begin().await.unwrap();
        let result = AnticipationRepository::write_plan(&txn, &plan).await;
        assert!(matches!(
            result,
            Err(SeriesError::StaleEligibility(id)) if id == series[2].id
        ));
        txn.rollback().await.unwrap();

        assert!(matches!(
            entries.get_entry(user_id, plan.consolidated.id).await,
            Err(SeriesError::EntryNotFound(_))
        ));
        let stored = entries.list_series(user_id, series_id).await.unwrap();
        assert!(stored.iter().all(|e| !e.is_anticipated));
        let repo = AnticipationRepository::new(db);
        assert!(
            repo.list_anticipations(user_id, series_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_write_plan_after_overlapping_anticipation_is_stale() {
        let db = setup().await;
        let entries = EntryRepository::new(db.clone());
        let repo = AnticipationRepository::new(db.clone());
        let user_id = UserId::new();
        let series = four_installments(&entries, user_id).await;
        let series_id = series[0].series_id.unwrap();

        let plan = plan_unlocked(&db, &series[1..]).await;
        let winner = repo.create_anticipation(&request(&series[3..])).await.unwrap();

        let txn = db.begin().await.unwrap();
        let result = AnticipationRepository::write_plan(&txn, &plan).await;
        assert!(matches!(
            result,
            Err(SeriesError::StaleEligibility(id)) if id == series[3].id
        ));
        txn.rollback().await.unwrap();

        assert!(matches!(
            entries.get_entry(user_id, plan.consolidated.id).await,
            Err(SeriesError::EntryNotFound(_))
        ));
        let stored = entries.list_series(user_id, series_id).await.unwrap();
        assert_eq!(stored[3].covered_by_anticipation_id, Some(winner.anticipation.id));
        assert!(stored[..3].iter().all(|e| !e.is_anticipated));
    }
}
