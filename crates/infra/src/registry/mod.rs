//! Chart-of-accounts read interface used by the posting engine and reports.

mod in_memory;
mod postgres;

use std::collections::HashMap;

use booksmith_accounting::Account;

use crate::error::StoreResult;

pub use in_memory::InMemoryAccountRegistry;

/// Account lookup by code. Writes belong to chart setup, not to the ledger core.
#[async_trait::async_trait]
pub trait AccountRegistry: Send + Sync {
    async fn lookup(&self, code: &str) -> StoreResult<Option<Account>>;

    /// Every account in the chart, ordered by code.
    async fn list(&self) -> StoreResult<Vec<Account>>;

    /// Add an account. A duplicate code is `Conflict`.
    async fn register(&self, account: Account) -> StoreResult<Account>;

    /// Resolve several codes at once. Unknown codes are simply absent from the map.
    async fn lookup_many(&self, codes: &[&str]) -> StoreResult<HashMap<String, Account>> {
        let mut found = HashMap::with_capacity(codes.len());
        for code in codes {
            if let Some(account) = self.lookup(code).await? {
                found.insert(account.code.clone(), account);
            }
        }
        Ok(found)
    }
}

#[async_trait::async_trait]
impl<T> AccountRegistry for std::sync::Arc<T>
where
    T: AccountRegistry + ?Sized,
{
    async fn lookup(&self, code: &str) -> StoreResult<Option<Account>> {
        (**self).lookup(code).await
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        (**self).list().await
    }

    async fn register(&self, account: Account) -> StoreResult<Account> {
        (**self).register(account).await
    }

    async fn lookup_many(&self, codes: &[&str]) -> StoreResult<HashMap<String, Account>> {
        (**self).lookup_many(codes).await
    }
}
