//! Ledger error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failure of a posting, numbering or reporting call.
///
/// Every variant means the call had no effect: nothing was persisted and no
/// voucher number was consumed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// A posting referenced an account code that is not in the chart.
    #[error("account not found: {code}")]
    AccountNotFound { code: String },

    /// Debits and credits differ by more than the balance tolerance.
    #[error("entry is unbalanced: debit {total_debit} != credit {total_credit}")]
    Unbalanced {
        total_debit: Decimal,
        total_credit: Decimal,
    },

    /// The sequence row could not be locked or updated (timeout, serialization conflict).
    #[error("voucher sequence contention: {0}")]
    SequenceContention(String),

    /// Persistence is unavailable or failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The request itself is malformed (no lines, non-positive amounts...).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("journal entry not found: {0}")]
    EntryNotFound(String),

    /// The requested transition is not allowed from the entry's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn account_not_found(code: impl Into<String>) -> Self {
        Self::AccountNotFound { code: code.into() }
    }

    /// Whether retrying the whole call may succeed without changing the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SequenceContention(_) | Self::Storage(_))
    }
}
