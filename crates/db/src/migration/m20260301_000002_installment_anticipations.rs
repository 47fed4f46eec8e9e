//! Installment anticipations migration.
//!
//! One row per anticipation, pointing at the consolidated entry it created.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_transaction_entries::TransactionEntries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstallmentAnticipations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstallmentAnticipations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::SeriesId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::EntryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::InstallmentCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::TotalAmount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::Discount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::AnticipationPeriod)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::AnticipationDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::PayerId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentAnticipations::CategoryId)
                            .uuid()
                            .null(),
                    )
                    .col(ColumnDef::new(InstallmentAnticipations::Note).text().null())
                    .col(
                        ColumnDef::new(InstallmentAnticipations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_anticipations_entry")
                            .from(
                                InstallmentAnticipations::Table,
                                InstallmentAnticipations::EntryId,
                            )
                            .to(TransactionEntries::Table, TransactionEntries::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_anticipations_series")
                    .table(InstallmentAnticipations::Table)
                    .col(InstallmentAnticipations::SeriesId)
                    .col(InstallmentAnticipations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(InstallmentAnticipations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum InstallmentAnticipations {
    Table,
    Id,
    UserId,
    SeriesId,
    EntryId,
    InstallmentCount,
    TotalAmount,
    Discount,
    AnticipationPeriod,
    AnticipationDate,
    PayerId,
    CategoryId,
    Note,
    CreatedAt,
}
