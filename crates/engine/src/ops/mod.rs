use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, SplitKind, SplitStrategy};

mod access;
mod expenses;
mod groups;
mod ledger;
mod members;
mod payments;

/// Evaluate `$body` inside a fresh database transaction bound to `$tx`.
///
/// The transaction commits when the body yields `Ok`; on `Err` it is dropped,
/// which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        match $body {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Ledger store: persists groups and their history and runs the pure core
/// against it.
///
/// Every public operation runs in its own database transaction, so a balance
/// read followed by a dependent write (see [`Engine::settle_group`]) cannot
/// interleave with a concurrent writer.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Input for creating or replacing an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub payer_id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub strategy: SplitStrategy,
    /// Participants in split order; strategy parameters follow this order.
    pub participants: Vec<Uuid>,
    pub occurred_at: DateTime<Utc>,
    /// Strategy tag to store instead of the one `strategy` implies, for edits
    /// that replay or rescale existing split amounts.
    pub recorded_as: Option<SplitKind>,
}

impl NewExpense {
    pub fn kind(&self) -> SplitKind {
        self.recorded_as.unwrap_or_else(|| self.strategy.kind())
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
}

impl EngineBuilder {
    /// Connection the engine runs on; migrations must already be applied.
    pub fn database(mut self, db: DatabaseConnection) -> Self {
        self.database = Some(db);
        self
    }

    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self.database.ok_or_else(|| {
            EngineError::Validation("engine needs a database connection".to_string())
        })?;
        Ok(Engine { database })
    }
}
