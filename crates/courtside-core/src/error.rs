//! Error types for the league engine.

use courtside_db::DbError;
use courtside_judge::JudgeError;
use courtside_ledger::LedgerError;

/// Failures surfaced by league operations.
///
/// Validation problems the caller can act on (`NotFound`, `Validation`)
/// are separate from infrastructure failures (`Db`), which propagate to
/// the triggering request unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A persistence call failed.
    #[error("storage error: {0}")]
    Db(#[from] DbError),

    /// A ledger posting was rejected.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The judge could not be constructed.
    #[error("judge error: {0}")]
    Judge(#[from] JudgeError),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected before any state changed.
    #[error("validation failed: {0}")]
    Validation(String),
}
