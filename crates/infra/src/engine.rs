//! Ledger posting engine: the single write path for accounting effects.
//!
//! ```text
//! PostingRequest
//!   ↓
//! 1. Resolve every account code (AccountNotFound, nothing written)
//!   ↓
//! 2. Round, total, balance-check (Unbalanced, nothing written)
//!   ↓
//! 3. Issue the journal number + persist entry and lines (one atomic unit)
//!   ↓
//! 4. Publish LedgerEvent (after commit; failures only logged)
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use booksmith_accounting::{
    Account, BalancePolicy, BusinessEvent, ChartOfAccounts, EntryStatus, IssuedNumber,
    JournalEntry, LedgerError, LedgerEvent, LedgerResult, Payment, PayrollRun, PostingRequest,
    PurchaseBill, SalesInvoice, SequenceDefaults, SequenceKey, SequenceSettings, StockAdjustment,
    VoucherSequence, VoucherType, prepare_entry, reversal_request, translate,
};
use booksmith_core::{FiscalYear, UserId};
use booksmith_events::{EventBus, InMemoryEventBus};

use crate::config::LedgerConfig;
use crate::journal::{InMemoryJournalStore, JournalQuery, JournalStore};
use crate::registry::{AccountRegistry, InMemoryAccountRegistry};
use crate::sequence::{InMemorySequenceStore, SequenceStore};

/// Everything the engine needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub chart: ChartOfAccounts,
    pub policy: BalancePolicy,
    pub initial_status: EntryStatus,
    pub sequences: SequenceDefaults,
}

impl From<&LedgerConfig> for EngineSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            chart: config.chart.clone(),
            policy: config.balance_policy(),
            initial_status: config.posting.initial_status,
            sequences: config.sequence_defaults(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

pub type DefaultBus = InMemoryEventBus<LedgerEvent>;

#[derive(Debug)]
pub struct LedgerEngine<R, S, J, B = DefaultBus> {
    registry: R,
    sequences: S,
    journal: J,
    bus: Option<B>,
    settings: EngineSettings,
}

/// Engine over the in-memory stores, sharing one sequence store between standalone
/// numbering and journal appends.
pub type InMemoryLedgerEngine = LedgerEngine<
    Arc<InMemoryAccountRegistry>,
    Arc<InMemorySequenceStore>,
    Arc<InMemoryJournalStore>,
>;

impl InMemoryLedgerEngine {
    /// In-memory engine with the standard chart seeded from `settings.chart`.
    pub fn in_memory(settings: EngineSettings) -> Self {
        let registry = Arc::new(InMemoryAccountRegistry::standard(&settings.chart));
        let sequences = Arc::new(InMemorySequenceStore::new());
        let journal = Arc::new(InMemoryJournalStore::new(sequences.clone()));
        LedgerEngine::new(registry, sequences, journal, settings)
    }
}

impl<R, S, J> LedgerEngine<R, S, J>
where
    R: AccountRegistry,
    S: SequenceStore,
    J: JournalStore,
{
    pub fn new(registry: R, sequences: S, journal: J, settings: EngineSettings) -> Self {
        Self {
            registry,
            sequences,
            journal,
            bus: None,
            settings,
        }
    }
}

impl<R, S, J, B> LedgerEngine<R, S, J, B>
where
    R: AccountRegistry,
    S: SequenceStore,
    J: JournalStore,
    B: EventBus<LedgerEvent>,
{
    /// Publish a [`LedgerEvent`] on `bus` after every commit.
    pub fn with_bus<B2: EventBus<LedgerEvent>>(self, bus: B2) -> LedgerEngine<R, S, J, B2> {
        LedgerEngine {
            registry: self.registry,
            sequences: self.sequences,
            journal: self.journal,
            bus: Some(bus),
            settings: self.settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn chart(&self) -> &ChartOfAccounts {
        &self.settings.chart
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    fn publish(&self, event: LedgerEvent) {
        let Some(bus) = &self.bus else {
            return;
        };
        let journal_number = event.journal_number().to_string();
        match bus.publish(event) {
            Ok(delivered) => debug!(journal_number = %journal_number, delivered, "ledger event published"),
            // The entry is committed; subscribers can catch up from the journal.
            Err(err) => {
                warn!(journal_number = %journal_number, error = ?err, "ledger event publication failed")
            }
        }
    }

    fn sequence_key(voucher_type: &VoucherType, fiscal_year: FiscalYear) -> SequenceKey {
        SequenceKey::new(voucher_type.clone(), fiscal_year)
    }

    /// Validate, balance-check and persist a journal entry.
    ///
    /// All-or-nothing: on any error no entry exists and no journal number was consumed.
    #[instrument(
        skip(self, request),
        fields(reference = %request.reference, entry_date = %request.entry_date, lines = request.lines.len()),
        err
    )]
    pub async fn post(&self, request: PostingRequest) -> LedgerResult<JournalEntry> {
        let mut codes = request.account_codes();
        if let Some(rounding) = &self.settings.policy.rounding_account_code {
            codes.push(rounding.as_str());
        }
        let accounts = self.registry.lookup_many(&codes).await?;
        let prepared = prepare_entry(&request, &accounts, &self.settings.policy)?;

        let key = Self::sequence_key(&VoucherType::journal(), FiscalYear::containing(request.entry_date));
        let settings = self.settings.sequences.settings_for(&key.voucher_type);
        let entry = self
            .journal
            .append(&key, &settings, prepared, self.settings.initial_status)
            .await?;

        info!(
            journal_number = %entry.journal_number,
            total = %entry.total_debit,
            status = entry.status.as_str(),
            "journal entry recorded"
        );
        self.publish(LedgerEvent::recorded(&entry));
        Ok(entry)
    }

    /// Draft -> posted.
    #[instrument(skip(self), err)]
    pub async fn approve(&self, journal_number: &str) -> LedgerResult<JournalEntry> {
        let entry = self.journal.mark_posted(journal_number).await?;
        info!(journal_number = %entry.journal_number, "journal entry approved");
        self.publish(LedgerEvent::approved(&entry));
        Ok(entry)
    }

    /// Post the mirror image of an existing entry. The original is left untouched.
    #[instrument(skip(self, author), err)]
    pub async fn reverse(
        &self,
        journal_number: &str,
        reversal_date: NaiveDate,
        author: UserId,
    ) -> LedgerResult<JournalEntry> {
        let original = self.entry(journal_number).await?;
        if let Some(existing) = self.journal.find_reversal(journal_number).await? {
            return Err(LedgerError::invalid_state(format!(
                "{journal_number} is already reversed by {}",
                existing.journal_number
            )));
        }
        let request = reversal_request(&original, reversal_date, author)?;
        self.post(request).await
    }

    pub async fn entry(&self, journal_number: &str) -> LedgerResult<JournalEntry> {
        self.journal
            .get(journal_number)
            .await?
            .ok_or_else(|| LedgerError::EntryNotFound(journal_number.to_string()))
    }

    pub async fn entries(&self, query: &JournalQuery) -> LedgerResult<Vec<JournalEntry>> {
        Ok(self.journal.query(query).await?)
    }

    pub async fn lookup_account(&self, code: &str) -> LedgerResult<Account> {
        self.registry
            .lookup(code)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(code))
    }

    /// Next formatted number for `voucher_type` in the current fiscal year.
    pub async fn issue_number(&self, voucher_type: &VoucherType) -> LedgerResult<String> {
        let issued = self
            .issue_number_for(voucher_type, Utc::now().date_naive())
            .await?;
        Ok(issued.formatted)
    }

    /// Next number for `voucher_type` in the fiscal year containing `date`.
    #[instrument(skip(self, voucher_type), fields(voucher_type = %voucher_type), err)]
    pub async fn issue_number_for(
        &self,
        voucher_type: &VoucherType,
        date: NaiveDate,
    ) -> LedgerResult<IssuedNumber> {
        let key = Self::sequence_key(voucher_type, FiscalYear::containing(date));
        let settings = self.settings.sequences.settings_for(voucher_type);
        Ok(self.sequences.next_value(&key, &settings).await?)
    }

    /// Restart numbering at 1, e.g. at fiscal-year rollover.
    #[instrument(
        skip(self, voucher_type, fiscal_year),
        fields(voucher_type = %voucher_type, fiscal_year = %fiscal_year),
        err
    )]
    pub async fn reset_sequence(
        &self,
        voucher_type: &VoucherType,
        fiscal_year: FiscalYear,
    ) -> LedgerResult<()> {
        let key = Self::sequence_key(voucher_type, fiscal_year);
        Ok(self.sequences.reset(&key).await?)
    }

    pub async fn configure_sequence(
        &self,
        voucher_type: &VoucherType,
        fiscal_year: FiscalYear,
        settings: &SequenceSettings,
    ) -> LedgerResult<VoucherSequence> {
        let key = Self::sequence_key(voucher_type, fiscal_year);
        Ok(self.sequences.configure(&key, settings).await?)
    }

    pub async fn peek_sequence(
        &self,
        voucher_type: &VoucherType,
        fiscal_year: FiscalYear,
    ) -> LedgerResult<Option<VoucherSequence>> {
        let key = Self::sequence_key(voucher_type, fiscal_year);
        Ok(self.sequences.peek(&key).await?)
    }

    pub async fn post_invoice(&self, invoice: &SalesInvoice, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::invoice_issued(self.chart(), invoice, author)?).await
    }

    pub async fn post_bill(&self, bill: &PurchaseBill, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::bill_posted(self.chart(), bill, author)?).await
    }

    pub async fn post_payment_received(&self, payment: &Payment, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::payment_received(self.chart(), payment, author)?).await
    }

    pub async fn post_payment_made(&self, payment: &Payment, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::payment_made(self.chart(), payment, author)?).await
    }

    pub async fn post_stock_adjustment(
        &self,
        adjustment: &StockAdjustment,
        author: UserId,
    ) -> LedgerResult<JournalEntry> {
        self.post(translate::stock_adjusted(self.chart(), adjustment, author)?).await
    }

    pub async fn post_payroll(&self, run: &PayrollRun, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::payroll_run(self.chart(), run, author)?).await
    }

    #[instrument(skip(self, event, author), fields(kind = event.kind(), reference = event.reference()), err)]
    pub async fn post_event(&self, event: &BusinessEvent, author: UserId) -> LedgerResult<JournalEntry> {
        self.post(translate::translate(self.chart(), event, author)?).await
    }
}
