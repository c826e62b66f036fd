//! Store operations used by the balance and settlement paths.
//!
//! Every function works on any sea-orm connection, so callers decide whether
//! it runs inside a transaction. Reads fail with `EngineError::StoreRead`,
//! writes with `EngineError::StoreWrite`.

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::{Expr, Query},
};
use uuid::Uuid;

use crate::{
    Allocation, Expense, ExpenseSplit, Profile, ResultEngine, Settlement,
    error::StoreResultExt,
    expense_splits, expenses,
    money::{from_minor, to_minor},
    profiles, settlement_allocations, settlements,
};

/// Unsettled splits the user owes or is owed.
pub(super) async fn list_unsettled_splits<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<ExpenseSplit>> {
    let paid_by_user = Query::select()
        .column(expenses::Column::Id)
        .from(expenses::Entity)
        .and_where(expenses::Column::PaidBy.eq(user_id))
        .to_owned();

    let rows = expense_splits::Entity::find()
        .filter(expense_splits::Column::IsSettled.eq(false))
        .filter(
            Condition::any()
                .add(expense_splits::Column::UserId.eq(user_id))
                .add(expense_splits::Column::ExpenseId.in_subquery(paid_by_user)),
        )
        .order_by_asc(expense_splits::Column::Id)
        .all(db)
        .await
        .on_read()?;
    Ok(rows.into_iter().map(ExpenseSplit::from).collect())
}

pub(super) async fn list_expenses_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
) -> ResultEngine<Vec<Expense>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = expenses::Entity::find()
        .filter(expenses::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
        .on_read()?;
    Ok(rows.into_iter().map(Expense::from).collect())
}

fn involving_user(user_id: &str) -> Condition {
    Condition::any()
        .add(settlements::Column::PaidBy.eq(user_id))
        .add(settlements::Column::PaidTo.eq(user_id))
}

fn in_group(group_id: Uuid) -> Condition {
    Condition::all().add(settlements::Column::GroupId.eq(group_id))
}

/// Settlements paid or received by the user, oldest first, with their
/// allocated amounts filled in.
pub(super) async fn list_settlements_involving_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<Settlement>> {
    let rows = settlements::Entity::find()
        .filter(involving_user(user_id))
        .order_by_asc(settlements::Column::SettledAt)
        .order_by_asc(settlements::Column::Id)
        .all(db)
        .await
        .on_read()?;
    with_allocated(db, rows, involving_user(user_id)).await
}

pub(super) async fn list_settlements_by_group<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
) -> ResultEngine<Vec<Settlement>> {
    let rows = settlements::Entity::find()
        .filter(in_group(group_id))
        .order_by_desc(settlements::Column::SettledAt)
        .order_by_desc(settlements::Column::Id)
        .all(db)
        .await
        .on_read()?;
    with_allocated(db, rows, in_group(group_id)).await
}

/// Fills in the allocated sums of `rows`, which must be the settlements
/// matching `scope`. The sums are aggregated by the store.
async fn with_allocated<C: ConnectionTrait>(
    db: &C,
    rows: Vec<settlements::Model>,
    scope: Condition,
) -> ResultEngine<Vec<Settlement>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let in_scope = Query::select()
        .column(settlements::Column::Id)
        .from(settlements::Entity)
        .cond_where(scope)
        .to_owned();
    let allocated_minor: HashMap<Uuid, i64> = settlement_allocations::Entity::find()
        .select_only()
        .column(settlement_allocations::Column::SettlementId)
        .column_as(settlement_allocations::Column::AmountMinor.sum(), "allocated_minor")
        .filter(settlement_allocations::Column::SettlementId.in_subquery(in_scope))
        .group_by(settlement_allocations::Column::SettlementId)
        .into_tuple::<(Uuid, i64)>()
        .all(db)
        .await
        .on_read()?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|model| {
            let allocated = allocated_minor.get(&model.id).copied().unwrap_or(0);
            let mut settlement = Settlement::from(model);
            settlement.allocated = from_minor(allocated);
            settlement
        })
        .collect())
}

pub(super) async fn list_profiles_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[String],
) -> ResultEngine<Vec<Profile>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = profiles::Entity::find()
        .filter(profiles::Column::Id.is_in(ids.iter().cloned()))
        .all(db)
        .await
        .on_read()?;
    Ok(rows.into_iter().map(Profile::from).collect())
}

pub(super) async fn insert_settlement<C: ConnectionTrait>(
    db: &C,
    settlement: &Settlement,
) -> ResultEngine<Settlement> {
    let model = settlements::ActiveModel::try_from(settlement)?
        .insert(db)
        .await
        .on_write()?;
    Ok(Settlement::from(model))
}

pub(super) async fn list_expenses_by_group_and_payer<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    payer_id: &str,
) -> ResultEngine<Vec<Expense>> {
    let rows = expenses::Entity::find()
        .filter(expenses::Column::GroupId.eq(group_id))
        .filter(expenses::Column::PaidBy.eq(payer_id))
        .all(db)
        .await
        .on_read()?;
    Ok(rows.into_iter().map(Expense::from).collect())
}

pub(super) async fn list_unsettled_splits_by_expense_ids_and_user<C: ConnectionTrait>(
    db: &C,
    expense_ids: &[Uuid],
    user_id: &str,
) -> ResultEngine<Vec<ExpenseSplit>> {
    if expense_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = expense_splits::Entity::find()
        .filter(expense_splits::Column::ExpenseId.is_in(expense_ids.iter().copied()))
        .filter(expense_splits::Column::UserId.eq(user_id))
        .filter(expense_splits::Column::IsSettled.eq(false))
        .all(db)
        .await
        .on_read()?;
    Ok(rows.into_iter().map(ExpenseSplit::from).collect())
}

/// Flags the given splits settled. Splits already settled are left alone, so
/// the returned count can be lower than `ids.len()`.
pub(super) async fn bulk_mark_splits_settled<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
) -> ResultEngine<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = expense_splits::Entity::update_many()
        .col_expr(expense_splits::Column::IsSettled, Expr::value(true))
        .filter(expense_splits::Column::Id.is_in(ids.iter().copied()))
        .filter(expense_splits::Column::IsSettled.eq(false))
        .exec(db)
        .await
        .on_write()?;
    Ok(result.rows_affected)
}

pub(super) async fn insert_allocations<C: ConnectionTrait>(
    db: &C,
    settlement_id: Uuid,
    allocation: &Allocation,
) -> ResultEngine<()> {
    if allocation.is_empty() {
        return Ok(());
    }
    let mut rows = Vec::with_capacity(allocation.splits.len());
    for (split_id, amount) in &allocation.splits {
        rows.push(settlement_allocations::ActiveModel {
            settlement_id: ActiveValue::Set(settlement_id),
            split_id: ActiveValue::Set(*split_id),
            amount_minor: ActiveValue::Set(to_minor(*amount)?),
        });
    }
    settlement_allocations::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .on_write()?;
    Ok(())
}

pub(super) async fn delete_allocations_for_splits<C: ConnectionTrait>(
    db: &C,
    split_ids: &[Uuid],
) -> ResultEngine<()> {
    if split_ids.is_empty() {
        return Ok(());
    }
    settlement_allocations::Entity::delete_many()
        .filter(settlement_allocations::Column::SplitId.is_in(split_ids.iter().copied()))
        .exec(db)
        .await
        .on_write()?;
    Ok(())
}
