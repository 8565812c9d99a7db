//! Ledger and settlement engine for shared group expenses.
//!
//! The pure core has three pieces, all synchronous and free of I/O:
//!
//! - [`compute_splits`]: split an expense total into exact per-participant
//!   shares ([`SplitStrategy`]).
//! - [`compute_balances`] / [`BalanceAggregator`]: fold expenses and
//!   repayments into per-member net balances.
//! - [`reduce`]: turn net balances into [`SettlementTransaction`]s.
//!
//! [`Engine`] is the ledger store on top of `sea-orm`: it persists groups,
//! members, expenses, splits and payments and runs the core against a
//! group's history inside a single database transaction.

pub use balance::{BalanceAggregator, Balances, MemberBalance, compute_balances};
pub use error::EngineError;
pub use expenses::Expense;
pub use groups::Group;
pub use members::Member;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, NewExpense};
pub use payments::Payment;
pub use settlement::{SettlementTransaction, ensure_settled, reduce};
pub use split::{
    Allocate, Equal, ExactAmounts, PERCENT_WHOLE, Percent, Percentages, Shares, SplitKind,
    SplitShare, SplitStrategy, compute_splits,
};
pub use splits::Split;

mod balance;
mod error;
mod expenses;
mod groups;
mod members;
mod money;
mod ops;
mod payments;
mod settlement;
mod split;
mod splits;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
