//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. The schema is written with
//! the portable schema builder so the same migrations run on PostgreSQL in
//! production and on SQLite in tests.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_transaction_entries;
mod m20260301_000002_installment_anticipations;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_transaction_entries::Migration),
            Box::new(m20260301_000002_installment_anticipations::Migration),
        ]
    }
}
