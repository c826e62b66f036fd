//! Balance and settlement engine for SplitXo.
//!
//! The engine answers one question, "who owes whom how much", from the
//! expenses, splits and settlements of a relational store, and records new
//! settlements by marking the splits they pay off.
//!
//! - [`compute_balances`] / [`BalanceLedger`]: pure balance computation.
//! - [`allocate_smallest_first`]: pure settlement allocation.
//! - [`Engine`]: runs both against the store through `sea-orm`.

pub use allocation::{Allocation, allocate_smallest_first};
pub use balances::{Balance, BalanceLedger, BalanceSummary, SETTLED_THRESHOLD, compute_balances};
pub use commands::{ExpenseCmd, SettleCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use expense_splits::ExpenseSplit;
pub use expenses::Expense;
pub use money::{MINOR_UNITS, parse_amount, round_cents, split_equally};
pub use ops::{AllocationStatus, Engine, EngineBuilder, ExpenseDetail, SettlementReceipt};
pub use profiles::Profile;
pub use settlements::Settlement;

mod allocation;
mod balances;
mod commands;
mod currency;
mod error;
mod expense_splits;
mod expenses;
mod money;
mod ops;
mod profiles;
mod settlement_allocations;
mod settlements;

type ResultEngine<T> = Result<T, EngineError>;
