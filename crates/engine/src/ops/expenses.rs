use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseCmd, ExpenseSplit, ResultEngine, error::StoreResultExt,
    expense_splits, expenses, money::ensure_positive,
};

use super::{Engine, normalize_optional_text, normalize_required_id, store, with_tx};

/// An expense with all its splits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDetail {
    pub expense: Expense,
    pub splits: Vec<ExpenseSplit>,
}

/// Validates an expense command and builds the rows to insert.
fn build_expense(cmd: ExpenseCmd) -> ResultEngine<ExpenseDetail> {
    let paid_by = normalize_required_id(&cmd.paid_by, "payer")?;
    let created_by = normalize_required_id(&cmd.created_by, "creator")?;
    ensure_positive(cmd.amount, "amount")?;
    if cmd.shares.is_empty() {
        return Err(EngineError::Validation(
            "an expense needs at least one split".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut total = Decimal::ZERO;
    let mut shares = Vec::with_capacity(cmd.shares.len());
    for (user_id, amount) in cmd.shares {
        let user_id = normalize_required_id(&user_id, "split user")?;
        ensure_positive(amount, "split amount")?;
        if !seen.insert(user_id.clone()) {
            return Err(EngineError::Validation(format!(
                "user {user_id} appears in more than one split"
            )));
        }
        total += amount;
        shares.push((user_id, amount));
    }
    if total != cmd.amount {
        return Err(EngineError::Validation(format!(
            "splits sum to {total}, expected {}",
            cmd.amount
        )));
    }

    let expense = Expense {
        id: Uuid::new_v4(),
        group_id: cmd.group_id,
        paid_by,
        amount: cmd.amount,
        currency: cmd.currency,
        category: normalize_optional_text(cmd.category.as_deref()),
        date: cmd.date,
        created_by,
        notes: normalize_optional_text(cmd.notes.as_deref()),
        receipt_ref: normalize_optional_text(cmd.receipt_ref.as_deref()),
        created_at: Utc::now(),
    };
    // The payer's own share is never owed to anyone.
    let splits = shares
        .into_iter()
        .map(|(user_id, amount)| {
            let mut split = ExpenseSplit::new(expense.id, user_id, amount);
            split.is_settled = split.user_id == expense.paid_by;
            split
        })
        .collect();

    Ok(ExpenseDetail { expense, splits })
}

impl Engine {
    /// Creates an expense and its splits atomically.
    ///
    /// The split amounts must sum exactly to the expense amount, and each
    /// user may appear in only one split.
    pub async fn create_expense(&self, cmd: ExpenseCmd) -> ResultEngine<ExpenseDetail> {
        let detail = build_expense(cmd)?;

        with_tx!(self, EngineError::StoreWrite, |db_tx| {
            expenses::ActiveModel::try_from(&detail.expense)?
                .insert(&db_tx)
                .await
                .on_write()?;
            let mut rows = Vec::with_capacity(detail.splits.len());
            for split in &detail.splits {
                rows.push(expense_splits::ActiveModel::try_from(split)?);
            }
            expense_splits::Entity::insert_many(rows)
                .exec_without_returning(&db_tx)
                .await
                .on_write()?;
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(
            expense_id = %detail.expense.id,
            group_id = %detail.expense.group_id,
            paid_by = %detail.expense.paid_by,
            amount = %detail.expense.amount,
            splits = detail.splits.len(),
            "expense created"
        );
        Ok(detail)
    }

    /// Returns an expense with its splits.
    pub async fn expense(&self, expense_id: Uuid) -> ResultEngine<ExpenseDetail> {
        with_tx!(self, EngineError::StoreRead, |db_tx| {
            let expense = expenses::Entity::find_by_id(expense_id)
                .one(&db_tx)
                .await
                .on_read()?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let splits = expense_splits::Entity::find()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .order_by_asc(expense_splits::Column::UserId)
                .all(&db_tx)
                .await
                .on_read()?;
            Ok(ExpenseDetail {
                expense: Expense::from(expense),
                splits: splits.into_iter().map(ExpenseSplit::from).collect(),
            })
        })
    }

    /// Deletes an expense together with its splits.
    ///
    /// Allocation rows pointing at those splits go too, so any settlement
    /// that covered them counts again as plain credit.
    pub async fn delete_expense(&self, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, EngineError::StoreWrite, |db_tx| {
            expenses::Entity::find_by_id(expense_id)
                .one(&db_tx)
                .await
                .on_read()?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

            let split_ids: Vec<Uuid> = expense_splits::Entity::find()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .all(&db_tx)
                .await
                .on_read()?
                .into_iter()
                .map(|m| m.id)
                .collect();

            store::delete_allocations_for_splits(&db_tx, &split_ids).await?;
            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .exec(&db_tx)
                .await
                .on_write()?;
            expenses::Entity::delete_by_id(expense_id)
                .exec(&db_tx)
                .await
                .on_write()?;

            tracing::info!(%expense_id, splits = split_ids.len(), "expense deleted");
            Ok(())
        })
    }

    /// Manually flags a split settled or unsettled.
    ///
    /// Un-settling a split releases it from any settlement that covered it.
    pub async fn set_split_settled(
        &self,
        split_id: Uuid,
        settled: bool,
    ) -> ResultEngine<ExpenseSplit> {
        with_tx!(self, EngineError::StoreWrite, |db_tx| {
            let model = expense_splits::Entity::find_by_id(split_id)
                .one(&db_tx)
                .await
                .on_read()?
                .ok_or_else(|| EngineError::KeyNotFound("split not exists".to_string()))?;

            if !settled {
                store::delete_allocations_for_splits(&db_tx, &[split_id]).await?;
            }
            let updated = expense_splits::ActiveModel {
                id: ActiveValue::Set(model.id),
                is_settled: ActiveValue::Set(settled),
                ..Default::default()
            }
            .update(&db_tx)
            .await
            .on_write()?;

            tracing::info!(%split_id, settled, "split flag overridden");
            Ok(ExpenseSplit::from(updated))
        })
    }
}
