//! `SeaORM` Entity for transaction_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryCondition, PaymentMethod, SettlementStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub series_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub condition: EntryCondition,
    pub payment_method: PaymentMethod,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub purchase_date: Date,
    /// `YYYY-MM`.
    pub period: String,
    pub due_date: Option<Date>,
    pub settlement_date: Option<Date>,
    pub current_installment: Option<i32>,
    pub installment_count: Option<i32>,
    pub settlement: SettlementStatus,
    pub is_anticipated: bool,
    pub anticipation_id: Option<Uuid>,
    pub covered_by_anticipation_id: Option<Uuid>,
    pub payer_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::installment_anticipations::Entity")]
    InstallmentAnticipations,
}

impl Related<super::installment_anticipations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstallmentAnticipations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
