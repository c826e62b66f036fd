//! Net balances between one user and everyone they share expenses with.
//!
//! Balances are derived, never stored. [`BalanceLedger`] folds unsettled
//! splits and settlements into one signed running amount per counterparty:
//!
//! - positive: the counterparty owes the current user
//! - negative: the current user owes the counterparty
//!
//! Accumulation is exact; amounts are rounded to cents only when the ledger is
//! turned into a [`BalanceSummary`]. The whole computation is a pure function
//! of its inputs, so it is safe to repeat after any write.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Expense, ExpenseSplit, Profile, Settlement, money::round_cents};

/// Net amounts at or below this magnitude (after rounding) count as settled.
pub const SETTLED_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Net balance with a single counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub counterparty_user_id: String,
    pub counterparty_name: String,
    pub amount: Decimal,
}

/// Balances of one user plus aggregate totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Ordered by counterparty user id.
    pub balances: Vec<Balance>,
    /// What others owe the user.
    pub total_owed: Decimal,
    /// What the user owes others.
    pub total_owe: Decimal,
}

impl BalanceSummary {
    /// `total_owed - total_owe`.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.total_owed - self.total_owe
    }

    /// Returns the entry for `user_id`, if it is above the threshold.
    #[must_use]
    pub fn with(&self, user_id: &str) -> Option<&Balance> {
        self.balances
            .iter()
            .find(|b| b.counterparty_user_id == user_id)
    }
}

/// Running per-counterparty amounts for one user.
#[derive(Clone, Debug)]
pub struct BalanceLedger {
    user_id: String,
    accumulators: BTreeMap<String, Decimal>,
}

impl BalanceLedger {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            accumulators: BTreeMap::new(),
        }
    }

    fn add(&mut self, counterparty: &str, amount: Decimal) {
        *self
            .accumulators
            .entry(counterparty.to_string())
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Folds unsettled splits into the ledger.
    ///
    /// Splits whose owning expense is not in `expenses` are skipped, as are
    /// settled splits and splits that do not involve the user.
    pub fn apply_splits(&mut self, splits: &[ExpenseSplit], expenses: &[Expense]) {
        let by_id: HashMap<Uuid, &Expense> = expenses.iter().map(|e| (e.id, e)).collect();

        for split in splits.iter().filter(|s| !s.is_settled) {
            let Some(expense) = by_id.get(&split.expense_id) else {
                tracing::debug!(
                    split_id = %split.id,
                    expense_id = %split.expense_id,
                    "skipping split without owning expense"
                );
                continue;
            };

            let paid_by_user = expense.paid_by == self.user_id;
            let owed_by_user = split.user_id == self.user_id;
            match (paid_by_user, owed_by_user) {
                (true, false) => self.add(&split.user_id, split.amount),
                (false, true) => self.add(&expense.paid_by, -split.amount),
                _ => {}
            }
        }
    }

    /// Folds settlements into the ledger.
    ///
    /// Only the unallocated remainder of a settlement counts: the allocated
    /// part already removed its splits from the balance. Paying someone
    /// raises the counterparty's entry (less owed to them); being paid lowers
    /// it.
    pub fn apply_settlements(&mut self, settlements: &[Settlement]) {
        for settlement in settlements {
            let remainder = settlement.unallocated();
            if remainder.is_zero() || settlement.paid_by == settlement.paid_to {
                continue;
            }
            if settlement.paid_by == self.user_id {
                self.add(&settlement.paid_to, remainder);
            } else if settlement.paid_to == self.user_id {
                self.add(&settlement.paid_by, -remainder);
            }
        }
    }

    /// Counterparties currently tracked, in id order.
    #[must_use]
    pub fn counterparties(&self) -> Vec<String> {
        self.accumulators.keys().cloned().collect()
    }

    /// Rounds, filters and totals the ledger.
    ///
    /// Counterparty names come from `profiles`; unknown users fall back to
    /// their id.
    #[must_use]
    pub fn finish(self, profiles: &[Profile]) -> BalanceSummary {
        let names: HashMap<&str, &Profile> =
            profiles.iter().map(|p| (p.id.as_str(), p)).collect();

        let balances: Vec<Balance> = self
            .accumulators
            .into_iter()
            .filter_map(|(counterparty, raw)| {
                let amount = round_cents(raw);
                if amount.abs() <= SETTLED_THRESHOLD {
                    return None;
                }
                let counterparty_name = names
                    .get(counterparty.as_str())
                    .map(|p| p.display_name())
                    .unwrap_or_else(|| counterparty.clone());
                Some(Balance {
                    counterparty_user_id: counterparty,
                    counterparty_name,
                    amount,
                })
            })
            .collect();

        let total_owed: Decimal = balances
            .iter()
            .filter(|b| b.amount.is_sign_positive())
            .map(|b| b.amount)
            .sum();
        let total_owe: Decimal = balances
            .iter()
            .filter(|b| b.amount.is_sign_negative())
            .map(|b| b.amount.abs())
            .sum();

        BalanceSummary {
            balances,
            total_owed: round_cents(total_owed),
            total_owe: round_cents(total_owe),
        }
    }
}

/// Computes the balances of `user_id` from explicit inputs.
///
/// `splits` should be the unsettled splits involving the user, `expenses` their
/// owning expenses and `settlements` the settlements the user took part in.
#[must_use]
pub fn compute_balances(
    user_id: &str,
    splits: &[ExpenseSplit],
    expenses: &[Expense],
    settlements: &[Settlement],
    profiles: &[Profile],
) -> BalanceSummary {
    let mut ledger = BalanceLedger::new(user_id);
    ledger.apply_splits(splits, expenses);
    ledger.apply_settlements(settlements);
    ledger.finish(profiles)
}
