use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod balances;
mod expenses;
mod profiles;
mod settlements;
mod store;

pub use expenses::ExpenseDetail;
pub use settlements::{AllocationStatus, SettlementReceipt};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// `$on_err` wraps a failing `begin`/`commit` (`EngineError::StoreRead` for
/// read snapshots, `EngineError::StoreWrite` otherwise).
macro_rules! with_tx {
    ($self:expr, $on_err:path, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await.map_err($on_err)?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await.map_err($on_err)?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_id(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
