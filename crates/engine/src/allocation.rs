//! Deciding which splits a settlement pays off.
//!
//! The allocator is greedy, smallest split first: it clears as many whole
//! splits as the payment allows and stops at the first split that would
//! overflow it. Splits are never partially settled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ExpenseSplit;

/// Splits chosen for one settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Chosen split ids with their amounts, smallest first.
    pub splits: Vec<(Uuid, Decimal)>,
    /// Sum of the chosen split amounts; never above the settlement amount.
    pub allocated: Decimal,
}

impl Allocation {
    #[must_use]
    pub fn split_ids(&self) -> Vec<Uuid> {
        self.splits.iter().map(|(id, _)| *id).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

/// Picks the splits covered by a payment of `amount`.
///
/// Candidates are sorted by amount (ties by id) and taken while the running
/// total stays within `amount`. Settled candidates are ignored.
#[must_use]
pub fn allocate_smallest_first(amount: Decimal, candidates: &[ExpenseSplit]) -> Allocation {
    let mut sorted: Vec<&ExpenseSplit> = candidates.iter().filter(|s| !s.is_settled).collect();
    sorted.sort_by(|a, b| a.amount.cmp(&b.amount).then_with(|| a.id.cmp(&b.id)));

    let mut allocation = Allocation::default();
    for split in sorted {
        let next = allocation.allocated + split.amount;
        if next > amount {
            break;
        }
        allocation.allocated = next;
        allocation.splits.push((split.id, split.amount));
    }
    allocation
}
