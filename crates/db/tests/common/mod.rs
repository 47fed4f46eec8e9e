//! Shared fixtures for repository tests.
//!
//! Every test gets its own in-memory SQLite database, migrated from scratch.
//! The pool holds a single connection: an in-memory database lives and dies
//! with its connection, and one connection also serializes transactions the
//! way row locks do on PostgreSQL.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use hearth_core::series::{
    AnticipationRequest, Condition, EntryTemplate, PaymentMethod, SeriesEntry, TransactionType,
};
use hearth_db::migration::{Migrator, MigratorTrait};
use hearth_shared::types::UserId;

/// Connects to a fresh migrated database.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Installment purchase of `total` split over `count` months from 2024-01.
pub fn installments(
    user_id: UserId,
    transaction_type: TransactionType,
    total: Decimal,
    count: u32,
) -> EntryTemplate {
    EntryTemplate {
        user_id,
        transaction_type,
        condition: Condition::Installment,
        payment_method: PaymentMethod::BankSlip,
        description: "Washing machine".to_string(),
        amount: total,
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        due_date: Some(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
        installment_count: Some(count),
        recurrence_count: None,
        settled: false,
        payer_id: None,
        account_id: None,
        card_id: None,
        category_id: None,
        note: Some("appliances".to_string()),
    }
}

/// Anticipation request for `entries` (all from one series).
pub fn anticipate(entries: &[SeriesEntry], discount: Decimal) -> AnticipationRequest {
    AnticipationRequest {
        user_id: entries[0].user_id,
        series_id: entries[0].series_id.unwrap(),
        entry_ids: entries.iter().map(|e| e.id).collect(),
        anticipation_period: "2024-06".to_string(),
        discount,
        anticipation_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        payer_id: None,
        category_id: None,
        note: None,
    }
}
