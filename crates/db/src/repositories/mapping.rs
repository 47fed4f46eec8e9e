//! Conversions between stored rows and core series types.

use chrono::{DateTime, FixedOffset};
use sea_orm::ActiveValue::Set;

use hearth_core::series::{
    Anticipation, Condition, PaymentMethod as CorePaymentMethod, SeriesEntry, SeriesError,
    Settlement, TransactionType as CoreTransactionType,
};
use hearth_shared::types::{
    AccountId, AnticipationId, CardId, CategoryId, EntryId, PayerId, Period, SeriesId, UserId,
};

use crate::entities::{
    installment_anticipations, transaction_entries,
    sea_orm_active_enums::{EntryCondition, PaymentMethod, SettlementStatus, TransactionType},
};

/// Converts DB transaction type to core transaction type.
pub(crate) fn db_type_to_core(t: TransactionType) -> CoreTransactionType {
    match t {
        TransactionType::Expense => CoreTransactionType::Expense,
        TransactionType::Income => CoreTransactionType::Income,
        TransactionType::Transfer => CoreTransactionType::Transfer,
    }
}

/// Converts core transaction type to DB transaction type.
pub(crate) fn core_type_to_db(t: CoreTransactionType) -> TransactionType {
    match t {
        CoreTransactionType::Expense => TransactionType::Expense,
        CoreTransactionType::Income => TransactionType::Income,
        CoreTransactionType::Transfer => TransactionType::Transfer,
    }
}

fn db_condition_to_core(c: EntryCondition) -> Condition {
    match c {
        EntryCondition::OneOff => Condition::OneOff,
        EntryCondition::Installment => Condition::Installment,
        EntryCondition::Recurring => Condition::Recurring,
    }
}

fn core_condition_to_db(c: Condition) -> EntryCondition {
    match c {
        Condition::OneOff => EntryCondition::OneOff,
        Condition::Installment => EntryCondition::Installment,
        Condition::Recurring => EntryCondition::Recurring,
    }
}

fn db_method_to_core(m: PaymentMethod) -> CorePaymentMethod {
    match m {
        PaymentMethod::Cash => CorePaymentMethod::Cash,
        PaymentMethod::DebitCard => CorePaymentMethod::DebitCard,
        PaymentMethod::CreditCard => CorePaymentMethod::CreditCard,
        PaymentMethod::BankTransfer => CorePaymentMethod::BankTransfer,
        PaymentMethod::BankSlip => CorePaymentMethod::BankSlip,
    }
}

fn core_method_to_db(m: CorePaymentMethod) -> PaymentMethod {
    match m {
        CorePaymentMethod::Cash => PaymentMethod::Cash,
        CorePaymentMethod::DebitCard => PaymentMethod::DebitCard,
        CorePaymentMethod::CreditCard => PaymentMethod::CreditCard,
        CorePaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        CorePaymentMethod::BankSlip => PaymentMethod::BankSlip,
    }
}

/// Converts DB settlement status to core settlement.
pub(crate) fn db_settlement_to_core(s: SettlementStatus) -> Settlement {
    match s {
        SettlementStatus::Settled => Settlement::Settled,
        SettlementStatus::Unsettled => Settlement::Unsettled,
        SettlementStatus::NotApplicable => Settlement::NotApplicable,
    }
}

/// Converts core settlement to DB settlement status.
pub(crate) fn core_settlement_to_db(s: Settlement) -> SettlementStatus {
    match s {
        Settlement::Settled => SettlementStatus::Settled,
        Settlement::Unsettled => SettlementStatus::Unsettled,
        Settlement::NotApplicable => SettlementStatus::NotApplicable,
    }
}

fn parse_period(raw: &str) -> Result<Period, SeriesError> {
    raw.parse()
        .map_err(|e| SeriesError::Internal(format!("Stored period is corrupt: {e}")))
}

fn to_u32(value: Option<i32>) -> Result<Option<u32>, SeriesError> {
    value
        .map(u32::try_from)
        .transpose()
        .map_err(|e| SeriesError::Internal(format!("Stored position is negative: {e}")))
}

fn to_i32(value: Option<u32>) -> Result<Option<i32>, SeriesError> {
    value
        .map(i32::try_from)
        .transpose()
        .map_err(|e| SeriesError::Internal(format!("Position out of range: {e}")))
}

/// Builds a core entry from a stored row.
pub(crate) fn entry_from_model(model: transaction_entries::Model) -> Result<SeriesEntry, SeriesError> {
    Ok(SeriesEntry {
        id: EntryId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        series_id: model.series_id.map(SeriesId::from_uuid),
        transaction_type: db_type_to_core(model.transaction_type),
        condition: db_condition_to_core(model.condition),
        payment_method: db_method_to_core(model.payment_method),
        description: model.description,
        amount: model.amount,
        purchase_date: model.purchase_date,
        period: parse_period(&model.period)?,
        due_date: model.due_date,
        settlement_date: model.settlement_date,
        current_installment: to_u32(model.current_installment)?,
        installment_count: to_u32(model.installment_count)?,
        settlement: db_settlement_to_core(model.settlement),
        is_anticipated: model.is_anticipated,
        anticipation_id: model.anticipation_id.map(AnticipationId::from_uuid),
        covered_by_anticipation_id: model.covered_by_anticipation_id.map(AnticipationId::from_uuid),
        payer_id: model.payer_id.map(PayerId::from_uuid),
        account_id: model.account_id.map(AccountId::from_uuid),
        card_id: model.card_id.map(CardId::from_uuid),
        category_id: model.category_id.map(CategoryId::from_uuid),
        note: model.note,
    })
}

/// Converts a batch of stored rows.
pub(crate) fn entries_from_models(
    models: Vec<transaction_entries::Model>,
) -> Result<Vec<SeriesEntry>, SeriesError> {
    models.into_iter().map(entry_from_model).collect()
}

/// Builds an insertable row from a core entry.
pub(crate) fn entry_to_active(
    entry: &SeriesEntry,
    now: DateTime<FixedOffset>,
) -> Result<transaction_entries::ActiveModel, SeriesError> {
    Ok(transaction_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        user_id: Set(entry.user_id.into_inner()),
        series_id: Set(entry.series_id.map(SeriesId::into_inner)),
        transaction_type: Set(core_type_to_db(entry.transaction_type)),
        condition: Set(core_condition_to_db(entry.condition)),
        payment_method: Set(core_method_to_db(entry.payment_method)),
        description: Set(entry.description.clone()),
        amount: Set(entry.amount),
        purchase_date: Set(entry.purchase_date),
        period: Set(entry.period.to_string()),
        due_date: Set(entry.due_date),
        settlement_date: Set(entry.settlement_date),
        current_installment: Set(to_i32(entry.current_installment)?),
        installment_count: Set(to_i32(entry.installment_count)?),
        settlement: Set(core_settlement_to_db(entry.settlement)),
        is_anticipated: Set(entry.is_anticipated),
        anticipation_id: Set(entry.anticipation_id.map(AnticipationId::into_inner)),
        covered_by_anticipation_id: Set(entry
            .covered_by_anticipation_id
            .map(AnticipationId::into_inner)),
        payer_id: Set(entry.payer_id.map(PayerId::into_inner)),
        account_id: Set(entry.account_id.map(AccountId::into_inner)),
        card_id: Set(entry.card_id.map(CardId::into_inner)),
        category_id: Set(entry.category_id.map(CategoryId::into_inner)),
        note: Set(entry.note.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

/// Builds a core anticipation from a stored row.
pub(crate) fn anticipation_from_model(
    model: installment_anticipations::Model,
) -> Result<Anticipation, SeriesError> {
    Ok(Anticipation {
        id: AnticipationId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        series_id: SeriesId::from_uuid(model.series_id),
        entry_id: EntryId::from_uuid(model.entry_id),
        installment_count: to_u32(Some(model.installment_count))?.unwrap_or_default(),
        total_amount: model.total_amount,
        discount: model.discount,
        anticipation_date: model.anticipation_date,
        anticipation_period: parse_period(&model.anticipation_period)?,
        payer_id: model.payer_id.map(PayerId::from_uuid),
        category_id: model.category_id.map(CategoryId::from_uuid),
        note: model.note,
    })
}

/// Builds an insertable row from a core anticipation.
pub(crate) fn anticipation_to_active(
    anticipation: &Anticipation,
    now: DateTime<FixedOffset>,
) -> Result<installment_anticipations::ActiveModel, SeriesError> {
    Ok(installment_anticipations::ActiveModel {
        id: Set(anticipation.id.into_inner()),
        user_id: Set(anticipation.user_id.into_inner()),
        series_id: Set(anticipation.series_id.into_inner()),
        entry_id: Set(anticipation.entry_id.into_inner()),
        installment_count: Set(to_i32(Some(anticipation.installment_count))?.unwrap_or_default()),
        total_amount: Set(anticipation.total_amount),
        discount: Set(anticipation.discount),
        anticipation_period: Set(anticipation.anticipation_period.to_string()),
        anticipation_date: Set(anticipation.anticipation_date),
        payer_id: Set(anticipation.payer_id.map(PayerId::into_inner)),
        category_id: Set(anticipation.category_id.map(CategoryId::into_inner)),
        note: Set(anticipation.note.clone()),
        created_at: Set(now),
    })
}
