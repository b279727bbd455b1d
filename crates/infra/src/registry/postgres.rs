use std::collections::HashMap;

use tracing::instrument;

use booksmith_accounting::Account;

use super::AccountRegistry;
use crate::error::{StoreResult, map_sqlx_error};
use crate::postgres::{PgLedgerStore, account_from_row};

#[async_trait::async_trait]
impl AccountRegistry for PgLedgerStore {
    async fn lookup(&self, code: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, account_type, normal_balance
            FROM accounts
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("lookup_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, account_type, normal_balance
            FROM accounts
            ORDER BY code ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;

        rows.iter().map(account_from_row).collect()
    }

    #[instrument(skip(self, account), fields(code = %account.code), err)]
    async fn register(&self, account: Account) -> StoreResult<Account> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, code, name, account_type, normal_balance)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(account.normal_balance.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("register_account", e))?;
        Ok(account)
    }

    async fn lookup_many(&self, codes: &[&str]) -> StoreResult<HashMap<String, Account>> {
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, account_type, normal_balance
            FROM accounts
            WHERE code = ANY($1)
            "#,
        )
        .bind(&codes)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("lookup_accounts", e))?;

        rows.iter()
            .map(|row| account_from_row(row).map(|a| (a.code.clone(), a)))
            .collect()
    }
}
