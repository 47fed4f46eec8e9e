//! Transaction entries migration.
//!
//! Creates the flat entry table. A series has no parent row: its entries share
//! `series_id` and are ordered by `current_installment`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransactionEntries::UserId).uuid().not_null())
                    .col(ColumnDef::new(TransactionEntries::SeriesId).uuid().null())
                    .col(
                        ColumnDef::new(TransactionEntries::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Condition)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::PaymentMethod)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::PurchaseDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Period)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionEntries::DueDate).date().null())
                    .col(
                        ColumnDef::new(TransactionEntries::SettlementDate)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::CurrentInstallment)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::InstallmentCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Settlement)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::IsAnticipated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::AnticipationId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::CoveredByAnticipationId)
                            .uuid()
                            .null(),
                    )
                    .col(ColumnDef::new(TransactionEntries::PayerId).uuid().null())
                    .col(ColumnDef::new(TransactionEntries::AccountId).uuid().null())
                    .col(ColumnDef::new(TransactionEntries::CardId).uuid().null())
                    .col(ColumnDef::new(TransactionEntries::CategoryId).uuid().null())
                    .col(ColumnDef::new(TransactionEntries::Note).text().null())
                    .col(
                        ColumnDef::new(TransactionEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Series lookups and scope resolution walk entries by position
        manager
            .create_index(
                Index::create()
                    .name("idx_entries_series_position")
                    .table(TransactionEntries::Table)
                    .col(TransactionEntries::SeriesId)
                    .col(TransactionEntries::CurrentInstallment)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_user_period")
                    .table(TransactionEntries::Table)
                    .col(TransactionEntries::UserId)
                    .col(TransactionEntries::Period)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_covered_by")
                    .table(TransactionEntries::Table)
                    .col(TransactionEntries::CoveredByAnticipationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TransactionEntries::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum TransactionEntries {
    Table,
    Id,
    UserId,
    SeriesId,
    TransactionType,
    Condition,
    PaymentMethod,
    Description,
    Amount,
    PurchaseDate,
    Period,
    DueDate,
    SettlementDate,
    CurrentInstallment,
    InstallmentCount,
    Settlement,
    IsAnticipated,
    AnticipationId,
    CoveredByAnticipationId,
    PayerId,
    AccountId,
    CardId,
    CategoryId,
    Note,
    CreatedAt,
    UpdatedAt,
}
