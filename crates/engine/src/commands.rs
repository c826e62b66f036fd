//! Command structs for engine write operations.
//!
//! These types group the parameters of settlements and expenses, keeping call
//! sites readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Currency, ResultEngine, money::split_equally};

/// Record a lump-sum payment from `payer_id` to `payee_id`.
#[derive(Clone, Debug)]
pub struct SettleCmd {
    pub group_id: Uuid,
    pub payer_id: String,
    pub payee_id: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub settled_at: DateTime<Utc>,
}

impl SettleCmd {
    #[must_use]
    pub fn new(
        group_id: Uuid,
        payer_id: impl Into<String>,
        payee_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            group_id,
            payer_id: payer_id.into(),
            payee_id: payee_id.into(),
            amount,
            notes: None,
            settled_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn settled_at(mut self, settled_at: DateTime<Utc>) -> Self {
        self.settled_at = settled_at;
        self
    }
}

/// Create an expense together with its splits.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub group_id: Uuid,
    pub paid_by: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub created_by: String,
    pub notes: Option<String>,
    pub receipt_ref: Option<String>,
    /// `(user_id, amount)` owed by each member, payer included.
    pub shares: Vec<(String, Decimal)>,
}

impl ExpenseCmd {
    /// New expense created by its payer, with no shares yet.
    #[must_use]
    pub fn new(group_id: Uuid, paid_by: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        let paid_by = paid_by.into();
        Self {
            group_id,
            created_by: paid_by.clone(),
            paid_by,
            amount,
            currency: Currency::default(),
            category: None,
            date,
            notes: None,
            receipt_ref: None,
            shares: Vec::new(),
        }
    }

    #[must_use]
    pub fn share(mut self, user_id: impl Into<String>, amount: Decimal) -> Self {
        self.shares.push((user_id.into(), amount));
        self
    }

    /// Replaces the shares with an equal split among `members`.
    pub fn split_equally(mut self, members: &[String]) -> ResultEngine<Self> {
        self.shares = split_equally(self.amount, members)?;
        Ok(self)
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = user_id.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn receipt_ref(mut self, receipt_ref: impl Into<String>) -> Self {
        self.receipt_ref = Some(receipt_ref.into());
        self
    }
}
