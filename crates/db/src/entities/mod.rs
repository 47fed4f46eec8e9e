//! `SeaORM` entity definitions.

pub mod installment_anticipations;
pub mod sea_orm_active_enums;
pub mod transaction_entries;
