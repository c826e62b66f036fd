//! Settlements.
//!
//! A [`Settlement`] is a lump-sum payment from `paid_by` to `paid_to` inside
//! a group. Settlements are append-only ledger entries: the engine never
//! updates or deletes them.
//!
//! Part of a settlement may be *allocated* to specific splits, one row per
//! split in the `settlement_allocations` table. Those splits
//! are flagged settled and drop out of the balance; only the unallocated
//! remainder still counts as credit between the two users.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    money::{from_minor, to_minor},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: String,
    pub paid_to: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub settled_at: DateTime<Utc>,
    /// Sum of the split amounts this settlement covers.
    pub allocated: Decimal,
}

impl Settlement {
    pub fn new(
        group_id: Uuid,
        paid_by: impl Into<String>,
        paid_to: impl Into<String>,
        amount: Decimal,
        notes: Option<String>,
        settled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            paid_by: paid_by.into(),
            paid_to: paid_to.into(),
            amount,
            notes,
            settled_at,
            allocated: Decimal::ZERO,
        }
    }

    /// Part of the payment not covering any split.
    #[must_use]
    pub fn unallocated(&self) -> Decimal {
        (self.amount - self.allocated).max(Decimal::ZERO)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: String,
    pub paid_to: String,
    pub amount_minor: i64,
    pub notes: Option<String>,
    pub settled_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::settlement_allocations::Entity")]
    SettlementAllocations,
}

impl Related<super::settlement_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Settlement> for ActiveModel {
    type Error = EngineError;

    fn try_from(settlement: &Settlement) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(settlement.id),
            group_id: ActiveValue::Set(settlement.group_id),
            paid_by: ActiveValue::Set(settlement.paid_by.clone()),
            paid_to: ActiveValue::Set(settlement.paid_to.clone()),
            amount_minor: ActiveValue::Set(to_minor(settlement.amount)?),
            notes: ActiveValue::Set(settlement.notes.clone()),
            settled_at: ActiveValue::Set(settlement.settled_at),
        })
    }
}

impl From<Model> for Settlement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            paid_by: model.paid_by,
            paid_to: model.paid_to,
            amount: from_minor(model.amount_minor),
            notes: model.notes,
            settled_at: model.settled_at,
            allocated: Decimal::ZERO,
        }
    }
}
