use std::collections::BTreeSet;

use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{BalanceLedger, BalanceSummary, EngineError, ResultEngine};

use super::{Engine, store, with_tx};

impl Engine {
    /// Computes the net balances of `user_id` against everyone they share
    /// unsettled expenses or settlements with.
    ///
    /// All reads happen in one transaction, so the result reflects a single
    /// snapshot of the store. Nothing is written; call it again after any
    /// write to refresh a view.
    pub async fn balances(&self, user_id: &str) -> ResultEngine<BalanceSummary> {
        with_tx!(self, EngineError::StoreRead, |db_tx| {
            let splits = store::list_unsettled_splits(&db_tx, user_id).await?;
            let expense_ids: Vec<Uuid> = splits
                .iter()
                .map(|s| s.expense_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let expenses = store::list_expenses_by_ids(&db_tx, &expense_ids).await?;
            let settlements = store::list_settlements_involving_user(&db_tx, user_id).await?;

            let mut ledger = BalanceLedger::new(user_id);
            ledger.apply_splits(&splits, &expenses);
            ledger.apply_settlements(&settlements);

            let profiles = store::list_profiles_by_ids(&db_tx, &ledger.counterparties()).await?;
            tracing::debug!(
                user_id,
                splits = splits.len(),
                settlements = settlements.len(),
                "balances recomputed"
            );
            Ok(ledger.finish(&profiles))
        })
    }
}
