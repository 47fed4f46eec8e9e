//! Enums stored as short strings so the schema stays portable across backends.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored `transaction_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionType {
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

/// Stored `condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryCondition {
    #[sea_orm(string_value = "one_off")]
    OneOff,
    #[sea_orm(string_value = "installment")]
    Installment,
    #[sea_orm(string_value = "recurring")]
    Recurring,
}

/// Stored `payment_method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "debit_card")]
    DebitCard,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "bank_slip")]
    BankSlip,
}

/// Stored `settlement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "settled")]
    Settled,
    #[sea_orm(string_value = "unsettled")]
    Unsettled,
    #[sea_orm(string_value = "not_applicable")]
    NotApplicable,
}
