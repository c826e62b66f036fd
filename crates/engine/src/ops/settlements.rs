use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Allocation, BalanceSummary, EngineError, ResultEngine, SettleCmd, Settlement,
    allocate_smallest_first, money::ensure_positive,
};

use super::{Engine, normalize_optional_text, normalize_required_id, store, with_tx};

/// What happened to the splits covered by a new settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AllocationStatus {
    /// The listed splits are now settled.
    Applied(Allocation),
    /// Split bookkeeping failed; the settlement itself is recorded.
    Failed { reason: String },
}

/// Result of [`Engine::record_settlement`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub settlement: Settlement,
    pub allocation: AllocationStatus,
    /// Fresh balances of the payer, if they could be recomputed.
    pub balances: Option<BalanceSummary>,
}

impl SettlementReceipt {
    /// Ids of the splits this settlement marked settled.
    #[must_use]
    pub fn marked_split_ids(&self) -> Vec<Uuid> {
        match &self.allocation {
            AllocationStatus::Applied(allocation) => allocation.split_ids(),
            AllocationStatus::Failed { .. } => Vec::new(),
        }
    }
}

fn validate_settle_cmd(cmd: &SettleCmd) -> ResultEngine<(String, String)> {
    let payer = normalize_required_id(&cmd.payer_id, "payer")?;
    let payee = normalize_required_id(&cmd.payee_id, "payee")?;
    if payer == payee {
        return Err(EngineError::Validation(
            "payer and payee must differ".to_string(),
        ));
    }
    ensure_positive(cmd.amount, "amount")?;
    Ok((payer, payee))
}

impl Engine {
    /// Records a payment from `cmd.payer_id` to `cmd.payee_id` and marks the
    /// payer's splits it pays off.
    ///
    /// The settlement row is written first and is never rolled back. Marking
    /// splits runs in its own transaction: if it fails, the receipt reports
    /// [`AllocationStatus::Failed`] and no split is touched. The payer's
    /// balances are recomputed afterwards and attached to the receipt.
    pub async fn record_settlement(&self, cmd: SettleCmd) -> ResultEngine<SettlementReceipt> {
        let (payer, payee) = validate_settle_cmd(&cmd)?;

        let settlement = Settlement::new(
            cmd.group_id,
            payer,
            payee,
            cmd.amount,
            normalize_optional_text(cmd.notes.as_deref()),
            cmd.settled_at,
        );
        let mut settlement = store::insert_settlement(&self.database, &settlement).await?;
        tracing::info!(
            settlement_id = %settlement.id,
            group_id = %settlement.group_id,
            paid_by = %settlement.paid_by,
            paid_to = %settlement.paid_to,
            amount = %settlement.amount,
            "settlement recorded"
        );

        let allocation = match self.allocate_settlement(&settlement).await {
            Ok(allocation) => {
                settlement.allocated = allocation.allocated;
                tracing::debug!(
                    settlement_id = %settlement.id,
                    splits = allocation.splits.len(),
                    allocated = %allocation.allocated,
                    "splits marked settled"
                );
                AllocationStatus::Applied(allocation)
            }
            Err(err) => {
                tracing::warn!(
                    settlement_id = %settlement.id,
                    error = %err,
                    "settlement recorded but no split was marked settled"
                );
                AllocationStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let balances = match self.balances(&settlement.paid_by).await {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::warn!(
                    user_id = %settlement.paid_by,
                    error = %err,
                    "failed to refresh balances after settlement"
                );
                None
            }
        };

        Ok(SettlementReceipt {
            settlement,
            allocation,
            balances,
        })
    }

    /// Marks the payer's smallest unsettled splits owed to the payee, within
    /// the settlement amount, and records which splits were covered.
    async fn allocate_settlement(&self, settlement: &Settlement) -> ResultEngine<Allocation> {
        with_tx!(self, EngineError::StoreWrite, |db_tx| {
            let expenses = store::list_expenses_by_group_and_payer(
                &db_tx,
                settlement.group_id,
                &settlement.paid_to,
            )
            .await?;
            let expense_ids: Vec<Uuid> = expenses.iter().map(|e| e.id).collect();
            let candidates = store::list_unsettled_splits_by_expense_ids_and_user(
                &db_tx,
                &expense_ids,
                &settlement.paid_by,
            )
            .await?;

            let allocation = allocate_smallest_first(settlement.amount, &candidates);
            if !allocation.is_empty() {
                let marked = store::bulk_mark_splits_settled(&db_tx, &allocation.split_ids()).await?;
                if marked != allocation.splits.len() as u64 {
                    return Err(EngineError::AllocationConflict(format!(
                        "expected to settle {} splits, settled {marked}",
                        allocation.splits.len()
                    )));
                }
                store::insert_allocations(&db_tx, settlement.id, &allocation).await?;
            }
            Ok(allocation)
        })
    }

    /// Settlement history of a group, newest first.
    pub async fn list_group_settlements(&self, group_id: Uuid) -> ResultEngine<Vec<Settlement>> {
        store::list_settlements_by_group(&self.database, group_id).await
    }
}
