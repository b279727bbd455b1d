//! Read-only report queries over stored entries and documents.
//!
//! Each call loads what it needs and hands it to the pure aggregations in
//! `booksmith_accounting::reports`. A storage error fails the whole report.

use chrono::NaiveDate;
use tracing::instrument;

use booksmith_accounting::reports::{
    self, AccountLedger, AgingOptions, AgingReport, BalanceSheet, CashFlow, ProfitAndLoss,
    TaxSummary, TrialBalance,
};
use booksmith_accounting::{AccountIndex, JournalEntry, LedgerError, LedgerResult};

use crate::documents::DocumentSource;
use crate::journal::{JournalQuery, JournalStore};
use crate::registry::AccountRegistry;

#[derive(Debug)]
pub struct ReportingService<R, J, D> {
    registry: R,
    journal: J,
    documents: D,
}

impl<R, J, D> ReportingService<R, J, D>
where
    R: AccountRegistry,
    J: JournalStore,
    D: DocumentSource,
{
    pub fn new(registry: R, journal: J, documents: D) -> Self {
        Self {
            registry,
            journal,
            documents,
        }
    }

    async fn accounts(&self) -> LedgerResult<AccountIndex> {
        Ok(AccountIndex::new(self.registry.list().await?))
    }

    async fn posted(&self, query: JournalQuery) -> LedgerResult<Vec<JournalEntry>> {
        Ok(self.journal.query(&query).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn trial_balance(&self, as_of: NaiveDate) -> LedgerResult<TrialBalance> {
        let entries = self.posted(JournalQuery::posted().until(as_of)).await?;
        reports::trial_balance(&entries, &self.accounts().await?, as_of)
    }

    #[instrument(skip(self), err)]
    pub async fn profit_and_loss(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<ProfitAndLoss> {
        let entries = self.posted(JournalQuery::posted().between(start, end)).await?;
        reports::profit_and_loss(&entries, &self.accounts().await?, start, end)
    }

    pub async fn balance_sheet(&self, as_of: NaiveDate) -> LedgerResult<BalanceSheet> {
        Ok(reports::balance_sheet(&self.trial_balance(as_of).await?))
    }

    #[instrument(skip(self), err)]
    pub async fn tax_summary(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<TaxSummary> {
        let invoices = self.documents.sales_invoices().await?;
        let bills = self.documents.purchase_bills().await?;
        reports::tax_summary(&invoices, &bills, start, end)
    }

    /// Receivables aging over sales invoices.
    pub async fn ar_aging(&self, as_of: NaiveDate, options: AgingOptions) -> LedgerResult<AgingReport> {
        let invoices = self.documents.sales_invoices().await?;
        Ok(reports::aging_report(&invoices, as_of, options))
    }

    /// Payables aging over purchase bills.
    pub async fn ap_aging(&self, as_of: NaiveDate, options: AgingOptions) -> LedgerResult<AgingReport> {
        let bills = self.documents.purchase_bills().await?;
        Ok(reports::aging_report(&bills, as_of, options))
    }

    pub async fn cash_flow(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<CashFlow> {
        let payments = self.documents.payments().await?;
        reports::cash_flow(&payments, start, end)
    }

    #[instrument(skip(self), err)]
    pub async fn account_ledger(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<AccountLedger> {
        let account = self
            .registry
            .lookup(code)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(code))?;
        let entries = self.posted(JournalQuery::posted().until(end)).await?;
        reports::account_ledger(&entries, &account, start, end)
    }
}
