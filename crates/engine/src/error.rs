//! The module contains the errors the engine can throw.
//!
//! Two kinds matter to callers of the pure core:
//!
//! - [`Validation`] malformed input, raised before any computation.
//! - [`Consistency`] an invariant violation discovered in already
//!   materialized data (split sums, non zero-sum balances).
//!
//! The remaining variants come from the ledger store.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Consistency`]: EngineError::Consistency
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Consistency error: {0}")]
    Consistency(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Member in use: {0}")]
    MemberInUse(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Consistency(a), Self::Consistency(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::MemberInUse(a), Self::MemberInUse(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
