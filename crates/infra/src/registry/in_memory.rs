use std::collections::BTreeMap;
use std::sync::RwLock;

use booksmith_accounting::{Account, ChartOfAccounts};

use super::AccountRegistry;
use crate::error::{StoreError, StoreResult};

/// In-memory chart of accounts, keyed by code.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountRegistry {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl InMemoryAccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.code.clone(), a)).collect()),
        }
    }

    /// Registry seeded with [`ChartOfAccounts::standard_accounts`].
    pub fn standard(chart: &ChartOfAccounts) -> Self {
        Self::with_accounts(chart.standard_accounts())
    }
}

#[async_trait::async_trait]
impl AccountRegistry for InMemoryAccountRegistry {
    async fn lookup(&self, code: &str) -> StoreResult<Option<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::poisoned("accounts"))?;
        Ok(accounts.get(code).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::poisoned("accounts"))?;
        Ok(accounts.values().cloned().collect())
    }

    async fn register(&self, account: Account) -> StoreResult<Account> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::poisoned("accounts"))?;
        if accounts.contains_key(&account.code) {
            return Err(StoreError::Conflict(format!(
                "account code {} already exists",
                account.code
            )));
        }
        accounts.insert(account.code.clone(), account.clone());
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booksmith_accounting::AccountType;

    #[tokio::test]
    async fn lookup_and_duplicate_codes() {
        let registry = InMemoryAccountRegistry::standard(&ChartOfAccounts::default());
        let ar = registry.lookup("1200").await.unwrap().unwrap();
        assert_eq!(ar.account_type, AccountType::Asset);
        assert!(registry.lookup("9999").await.unwrap().is_none());

        let dup = Account::new("1200", "Again", AccountType::Asset);
        assert!(matches!(registry.register(dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn lookup_many_skips_unknown_codes() {
        let registry = InMemoryAccountRegistry::standard(&ChartOfAccounts::default());
        let found = registry.lookup_many(&["1000", "9999", "4000"]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key("4000"));
    }

    #[tokio::test]
    async fn list_is_ordered_by_code() {
        let registry = InMemoryAccountRegistry::with_accounts([
            Account::new("4000", "Sales", AccountType::Income),
            Account::new("1000", "Cash", AccountType::Asset),
        ]);
        let codes: Vec<_> = registry.list().await.unwrap().into_iter().map(|a| a.code).collect();
        assert_eq!(codes, vec!["1000", "4000"]);
    }
}
