//! Parse and validation failures of the primitives in this crate.

use thiserror::Error;

/// Rejected input for an identifier or fiscal year.
///
/// Ledger operations report through `LedgerError` in `booksmith-accounting`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not a UUID; the message starts with the identifier type.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
