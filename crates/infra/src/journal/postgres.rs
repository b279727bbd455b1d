//! Postgres journal: `journal_entries` + `journal_lines`, written in one transaction.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgConnection;
use tracing::{Span, instrument};
use uuid::Uuid;

use booksmith_accounting::{
    EntryStatus, JournalEntry, JournalLine, PreparedEntry, SequenceKey, SequenceSettings, Side,
};
use booksmith_core::{AccountId, EntryId, UserId};

use super::{JournalQuery, JournalStore};
use crate::error::{StoreError, StoreResult, map_sqlx_error};
use crate::postgres::{PgLedgerStore, decode, parse};
use crate::sequence::postgres::issue_in_tx;

const ENTRY_COLUMNS: &str = "id, journal_number, entry_date, reference, description, status, \
     total_debit, total_credit, created_by, created_at, reversal_of";

fn line_from_row(row: &PgRow) -> StoreResult<(Uuid, JournalLine)> {
    let side: String = decode(row, "side")?;
    Ok((
        decode(row, "entry_id")?,
        JournalLine {
            account_id: AccountId::from_uuid(decode(row, "account_id")?),
            account_code: decode(row, "account_code")?,
            side: parse::<Side>(&side, "side")?,
            amount: decode(row, "amount")?,
            description: decode(row, "description")?,
        },
    ))
}

fn entry_from_row(row: &PgRow, lines: &mut HashMap<Uuid, Vec<JournalLine>>) -> StoreResult<JournalEntry> {
    let id: Uuid = decode(row, "id")?;
    let status: String = decode(row, "status")?;
    Ok(JournalEntry {
        id: EntryId::from_uuid(id),
        journal_number: decode(row, "journal_number")?,
        entry_date: decode(row, "entry_date")?,
        reference: decode(row, "reference")?,
        description: decode(row, "description")?,
        status: parse::<EntryStatus>(&status, "status")?,
        total_debit: decode(row, "total_debit")?,
        total_credit: decode(row, "total_credit")?,
        lines: lines.remove(&id).unwrap_or_default(),
        created_by: UserId::from_uuid(decode(row, "created_by")?),
        created_at: decode(row, "created_at")?,
        reversal_of: decode(row, "reversal_of")?,
    })
}

/// Load the lines of `rows` and assemble full entries, preserving row order.
async fn assemble(conn: &mut PgConnection, rows: Vec<PgRow>) -> StoreResult<Vec<JournalEntry>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids = rows
        .iter()
        .map(|row| decode::<Uuid>(row, "id"))
        .collect::<StoreResult<Vec<_>>>()?;

    let line_rows = sqlx::query(
        r#"
        SELECT entry_id, line_no, account_id, account_code, side, amount, description
        FROM journal_lines
        WHERE entry_id = ANY($1)
        ORDER BY entry_id, line_no ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load_lines", e))?;

    let mut lines: HashMap<Uuid, Vec<JournalLine>> = HashMap::with_capacity(ids.len());
    for row in &line_rows {
        let (entry_id, line) = line_from_row(row)?;
        lines.entry(entry_id).or_default().push(line);
    }

    rows.iter().map(|row| entry_from_row(row, &mut lines)).collect()
}

impl PgLedgerStore {
    /// Run an entry query and load the matching lines from the same snapshot.
    async fn load_where(
        &self,
        operation: &str,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> StoreResult<Vec<JournalEntry>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let rows = query
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        let entries = assemble(&mut *tx, rows).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_read", e))?;
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl JournalStore for PgLedgerStore {
    #[instrument(
        skip(self, key, settings, entry, status),
        fields(
            key = %key,
            reference = %entry.reference,
            lines = entry.lines.len(),
            journal_number = tracing::field::Empty
        ),
        err
    )]
    async fn append(
        &self,
        key: &SequenceKey,
        settings: &SequenceSettings,
        entry: PreparedEntry,
        status: EntryStatus,
    ) -> StoreResult<JournalEntry> {
        let mut tx = self.begin_locked().await?;
        let issued = issue_in_tx(&mut tx, key, settings).await?;
        let entry = entry.into_entry(issued.formatted, status, Utc::now());
        Span::current().record("journal_number", entry.journal_number.as_str());

        sqlx::query(
            r#"
            INSERT INTO journal_entries (
                id, journal_number, entry_date, reference, description, status,
                total_debit, total_credit, created_by, created_at, reversal_of
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.journal_number)
        .bind(entry.entry_date)
        .bind(&entry.reference)
        .bind(&entry.description)
        .bind(entry.status.as_str())
        .bind(entry.total_debit)
        .bind(entry.total_credit)
        .bind(entry.created_by.as_uuid())
        .bind(entry.created_at)
        .bind(&entry.reversal_of)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_entry", e))?;

        for (line_no, line) in entry.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO journal_lines (
                    entry_id, line_no, account_id, account_code, side, amount, description
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(entry.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.account_id.as_uuid())
            .bind(&line.account_code)
            .bind(line.side.as_str())
            .bind(line.amount)
            .bind(&line.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_line", e))?;
        }

        // Dropping the transaction on any error above rolls back the number too.
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_entry", e))?;
        Ok(entry)
    }

    async fn get(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE journal_number = $1");
        let mut found = self
            .load_where("get_entry", sqlx::query(&sql).bind(journal_number))
            .await?;
        Ok(found.pop())
    }

    async fn query(&self, query: &JournalQuery) -> StoreResult<Vec<JournalEntry>> {
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::date IS NULL OR entry_date >= $2) \
               AND ($3::date IS NULL OR entry_date <= $3) \
             ORDER BY entry_date ASC, journal_number ASC \
             LIMIT $4"
        );
        self.load_where(
            "query_entries",
            sqlx::query(&sql)
                .bind(query.status.map(EntryStatus::as_str))
                .bind(query.from)
                .bind(query.to)
                .bind(limit),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn mark_posted(&self, journal_number: &str) -> StoreResult<JournalEntry> {
        let updated = sqlx::query(
            r#"
            UPDATE journal_entries
            SET status = 'posted'
            WHERE journal_number = $1 AND status = 'draft'
            "#,
        )
        .bind(journal_number)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("mark_posted", e))?;

        let entry = self
            .get(journal_number)
            .await?
            .ok_or_else(|| StoreError::NotFound(journal_number.to_string()))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!("{journal_number} is already posted")));
        }
        Ok(entry)
    }

    async fn find_reversal(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE reversal_of = $1");
        let mut found = self
            .load_where("find_reversal", sqlx::query(&sql).bind(journal_number))
            .await?;
        Ok(found.pop())
    }
}
