//! Postgres sequence rows, locked with `SELECT ... FOR UPDATE` under `lock_timeout`.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Transaction};
use tracing::{debug, instrument};

use booksmith_accounting::{IssuedNumber, SequenceKey, SequenceSettings, VoucherSequence};
use booksmith_core::FiscalYear;

use super::SequenceStore;
use crate::error::{StoreError, StoreResult, map_sqlx_error};
use crate::postgres::{PgLedgerStore, decode, to_i64, to_u64};

fn sequence_from_row(row: &PgRow) -> StoreResult<VoucherSequence> {
    let voucher_type: String = decode(row, "voucher_type")?;
    let fiscal_year: String = decode(row, "fiscal_year")?;
    let padding: i32 = decode(row, "padding")?;
    Ok(VoucherSequence {
        voucher_type: voucher_type.as_str().into(),
        fiscal_year: fiscal_year
            .parse::<FiscalYear>()
            .map_err(|e| StoreError::Storage(format!("bad fiscal_year value: {e}")))?,
        prefix: decode(row, "prefix")?,
        next_number: to_u64(decode(row, "next_number")?, "next_number")?,
        padding: u32::try_from(padding)
            .map_err(|_| StoreError::Storage(format!("bad padding value: {padding}")))?,
    })
}

/// Issue a number inside the caller's transaction.
///
/// The row stays locked until the transaction ends; if the caller rolls back, the
/// increment is rolled back with it.
pub(crate) async fn issue_in_tx(
    tx: &mut Transaction<'static, Postgres>,
    key: &SequenceKey,
    settings: &SequenceSettings,
) -> StoreResult<IssuedNumber> {
    let fiscal_year = key.fiscal_year.to_string();

    sqlx::query(
        r#"
        INSERT INTO voucher_sequences (voucher_type, fiscal_year, prefix, next_number, padding)
        VALUES ($1, $2, $3, 1, $4)
        ON CONFLICT (voucher_type, fiscal_year) DO NOTHING
        "#,
    )
    .bind(key.voucher_type.as_str())
    .bind(&fiscal_year)
    .bind(&settings.prefix)
    .bind(settings.padding as i32)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("seed_sequence", e))?;

    let row = sqlx::query(
        r#"
        SELECT voucher_type, fiscal_year, prefix, next_number, padding
        FROM voucher_sequences
        WHERE voucher_type = $1 AND fiscal_year = $2
        FOR UPDATE
        "#,
    )
    .bind(key.voucher_type.as_str())
    .bind(&fiscal_year)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_sequence", e))?;
    let sequence = sequence_from_row(&row)?;

    let n = sequence.next_number;
    sqlx::query(
        r#"
        UPDATE voucher_sequences
        SET next_number = $3, updated_at = now()
        WHERE voucher_type = $1 AND fiscal_year = $2
        "#,
    )
    .bind(key.voucher_type.as_str())
    .bind(&fiscal_year)
    .bind(to_i64(n + 1, "next_number")?)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("increment_sequence", e))?;

    debug!(key = %key, number = n, "voucher number reserved");
    Ok(IssuedNumber {
        key: key.clone(),
        sequence: n,
        formatted: sequence.format(n),
    })
}

#[async_trait::async_trait]
impl SequenceStore for PgLedgerStore {
    #[instrument(skip(self, key, settings), fields(key = %key), err)]
    async fn next_value(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<IssuedNumber> {
        let mut tx = self.begin_locked().await?;
        let issued = issue_in_tx(&mut tx, key, settings).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_sequence", e))?;
        Ok(issued)
    }

    async fn peek(&self, key: &SequenceKey) -> StoreResult<Option<VoucherSequence>> {
        let row = sqlx::query(
            r#"
            SELECT voucher_type, fiscal_year, prefix, next_number, padding
            FROM voucher_sequences
            WHERE voucher_type = $1 AND fiscal_year = $2
            "#,
        )
        .bind(key.voucher_type.as_str())
        .bind(key.fiscal_year.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("peek_sequence", e))?;

        row.as_ref().map(sequence_from_row).transpose()
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    async fn reset(&self, key: &SequenceKey) -> StoreResult<()> {
        let mut tx = self.begin_locked().await?;
        sqlx::query(
            r#"
            UPDATE voucher_sequences
            SET next_number = 1, updated_at = now()
            WHERE voucher_type = $1 AND fiscal_year = $2
            "#,
        )
        .bind(key.voucher_type.as_str())
        .bind(key.fiscal_year.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("reset_sequence", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_reset", e))?;
        Ok(())
    }

    #[instrument(skip(self, key, settings), fields(key = %key, prefix = %settings.prefix), err)]
    async fn configure(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<VoucherSequence> {
        let mut tx = self.begin_locked().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO voucher_sequences (voucher_type, fiscal_year, prefix, next_number, padding)
            VALUES ($1, $2, $3, 1, $4)
            ON CONFLICT (voucher_type, fiscal_year)
            DO UPDATE SET prefix = EXCLUDED.prefix, padding = EXCLUDED.padding, updated_at = now()
            RETURNING voucher_type, fiscal_year, prefix, next_number, padding
            "#,
        )
        .bind(key.voucher_type.as_str())
        .bind(key.fiscal_year.to_string())
        .bind(&settings.prefix)
        .bind(settings.padding as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("configure_sequence", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_configure", e))?;

        sequence_from_row(&row)
    }
}
