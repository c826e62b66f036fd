//! Shared expenses.
//!
//! An `Expense` is a cost paid by one group member and shared among several
//! members through [`ExpenseSplit`](crate::ExpenseSplit)s. Expenses are
//! immutable; deleting one removes its splits.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError,
    money::{from_minor, to_minor},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub created_by: String,
    pub notes: Option<String>,
    /// Opaque reference to a stored receipt (the file itself lives elsewhere).
    pub receipt_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category: Option<String>,
    pub date: Date,
    pub created_by: String,
    pub notes: Option<String>,
    pub receipt_ref: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    ExpenseSplits,
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseSplits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Expense> for ActiveModel {
    type Error = EngineError;

    fn try_from(expense: &Expense) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(expense.id),
            group_id: ActiveValue::Set(expense.group_id),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            amount_minor: ActiveValue::Set(to_minor(expense.amount)?),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            category: ActiveValue::Set(expense.category.clone()),
            date: ActiveValue::Set(expense.date),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            notes: ActiveValue::Set(expense.notes.clone()),
            receipt_ref: ActiveValue::Set(expense.receipt_ref.clone()),
            created_at: ActiveValue::Set(expense.created_at),
        })
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            paid_by: model.paid_by,
            amount: from_minor(model.amount_minor),
            currency: model.currency.parse().unwrap_or_default(),
            category: model.category,
            date: model.date,
            created_by: model.created_by,
            notes: model.notes,
            receipt_ref: model.receipt_ref,
            created_at: model.created_at,
        }
    }
}
