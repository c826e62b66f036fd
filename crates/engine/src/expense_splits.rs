//! Expense splits.
//!
//! An [`ExpenseSplit`] is one member's share of an expense: `user_id` owes
//! `amount` to the expense payer until the split is settled. A split is
//! either settled or not; partial payment of a single split is not tracked.

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    money::{from_minor, to_minor},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: String,
    pub amount: Decimal,
    pub is_settled: bool,
}

impl ExpenseSplit {
    pub fn new(expense_id: Uuid, user_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            user_id: user_id.into(),
            amount,
            is_settled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub is_settled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
    #[sea_orm(has_many = "super::settlement_allocations::Entity")]
    SettlementAllocations,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::settlement_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&ExpenseSplit> for ActiveModel {
    type Error = EngineError;

    fn try_from(split: &ExpenseSplit) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(split.id),
            expense_id: ActiveValue::Set(split.expense_id),
            user_id: ActiveValue::Set(split.user_id.clone()),
            amount_minor: ActiveValue::Set(to_minor(split.amount)?),
            is_settled: ActiveValue::Set(split.is_settled),
        })
    }
}

impl From<Model> for ExpenseSplit {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            expense_id: model.expense_id,
            user_id: model.user_id,
            amount: from_minor(model.amount_minor),
            is_settled: model.is_settled,
        }
    }
}
