//! Storage error taxonomy shared by all adapters.

use thiserror::Error;

use booksmith_accounting::LedgerError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock could not be taken in time, or the transaction lost a serialization race.
    /// Nothing was written; the whole call may be retried.
    #[error("contention: {0}")]
    Contention(String),

    /// Backend unavailable or returned something unexpected.
    #[error("storage: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or state precondition failed (duplicate code, already posted...).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub(crate) fn poisoned(what: &str) -> Self {
        StoreError::Storage(format!("{what} lock poisoned"))
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Contention(msg) => LedgerError::SequenceContention(msg),
            StoreError::Storage(msg) => LedgerError::Storage(msg),
            StoreError::NotFound(msg) => LedgerError::EntryNotFound(msg),
            StoreError::Conflict(msg) => LedgerError::InvalidState(msg),
        }
    }
}

/// Map a sqlx error onto the store taxonomy.
///
/// | SQLSTATE | Meaning | StoreError |
/// |---|---|---|
/// | `55P03` | lock_not_available (lock_timeout hit) | `Contention` |
/// | `40001` | serialization_failure | `Contention` |
/// | `40P01` | deadlock_detected | `Contention` |
/// | `23505` | unique_violation | `Conflict` |
/// | other | | `Storage` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("55P03") | Some("40001") | Some("40P01") => StoreError::Contention(msg),
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Storage(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            StoreError::NotFound(format!("unexpected row not found in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
