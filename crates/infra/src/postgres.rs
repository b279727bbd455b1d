//! Postgres-backed ledger storage.
//!
//! One [`PgLedgerStore`] implements [`AccountRegistry`](crate::registry::AccountRegistry),
//! [`SequenceStore`](crate::sequence::SequenceStore) and
//! [`JournalStore`](crate::journal::JournalStore) over a shared pool, so a journal
//! append can issue its number and insert the entry in one transaction.
//!
//! `PgLedgerStore` is `Send + Sync`; the sqlx pool handles connection sharing.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;

use booksmith_accounting::{Account, AccountType, Side};
use booksmith_core::AccountId;

use crate::config::{DatabaseConfig, SequencesConfig};
use crate::error::{StoreError, StoreResult, map_sqlx_error};

const SCHEMA: &str = include_str!("../migrations/0001_ledger.sql");

#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Open a pool from configuration. `database.url` must be set.
    #[instrument(skip_all, err)]
    pub async fn connect(database: &DatabaseConfig, sequences: &SequencesConfig) -> StoreResult<Self> {
        let url = database
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Storage("database.url is not configured".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool, Duration::from_millis(sequences.lock_timeout_ms)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the ledger tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    /// Start a transaction whose row locks give up after the configured timeout.
    pub(crate) async fn begin_locked(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        // SET does not take bind parameters.
        let statement = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;
        Ok(tx)
    }
}

pub(crate) fn decode<T>(row: &PgRow, column: &str) -> StoreResult<T>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Storage(format!("failed to read column {column}: {e}")))
}

pub(crate) fn parse<T>(raw: &str, column: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e| StoreError::Storage(format!("bad {column} value: {e}")))
}

pub(crate) fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    let account_type: String = decode(row, "account_type")?;
    let normal_balance: String = decode(row, "normal_balance")?;
    Ok(Account {
        id: AccountId::from_uuid(decode(row, "id")?),
        code: decode(row, "code")?,
        name: decode(row, "name")?,
        account_type: parse::<AccountType>(&account_type, "account_type")?,
        normal_balance: parse::<Side>(&normal_balance, "normal_balance")?,
    })
}

pub(crate) fn to_i64(value: u64, what: &str) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::Storage(format!("{what} {value} out of range")))
}

pub(crate) fn to_u64(value: i64, what: &str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::Storage(format!("{what} {value} out of range")))
}
