//! Append-only journal storage.

mod in_memory;
mod postgres;

use chrono::NaiveDate;

use booksmith_accounting::{EntryStatus, JournalEntry, PreparedEntry, SequenceKey, SequenceSettings};

use crate::error::StoreResult;

pub use in_memory::InMemoryJournalStore;

/// Filter for [`JournalStore::query`]. Results are ordered by entry date, then number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalQuery {
    pub status: Option<EntryStatus>,
    /// Inclusive lower bound on entry date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on entry date.
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl JournalQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Posted entries only: what every report reads.
    pub fn posted() -> Self {
        Self {
            status: Some(EntryStatus::Posted),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn until(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.status.is_none_or(|s| entry.status == s)
            && self.from.is_none_or(|from| entry.entry_date >= from)
            && self.to.is_none_or(|to| entry.entry_date <= to)
    }
}

#[async_trait::async_trait]
pub trait JournalStore: Send + Sync {
    /// Issue the next number under `key` and persist `entry` with all its lines, as
    /// one unit. If the insert fails, no number is consumed.
    async fn append(
        &self,
        key: &SequenceKey,
        settings: &SequenceSettings,
        entry: PreparedEntry,
        status: EntryStatus,
    ) -> StoreResult<JournalEntry>;

    async fn get(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>>;

    async fn query(&self, query: &JournalQuery) -> StoreResult<Vec<JournalEntry>>;

    /// Draft -> posted. Unknown number is `NotFound`; an already posted entry is `Conflict`.
    async fn mark_posted(&self, journal_number: &str) -> StoreResult<JournalEntry>;

    /// The entry whose `reversal_of` is `journal_number`, if any.
    async fn find_reversal(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>>;
}

#[async_trait::async_trait]
impl<T> JournalStore for std::sync::Arc<T>
where
    T: JournalStore + ?Sized,
{
    async fn append(
        &self,
        key: &SequenceKey,
        settings: &SequenceSettings,
        entry: PreparedEntry,
        status: EntryStatus,
    ) -> StoreResult<JournalEntry> {
        (**self).append(key, settings, entry, status).await
    }

    async fn get(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        (**self).get(journal_number).await
    }

    async fn query(&self, query: &JournalQuery) -> StoreResult<Vec<JournalEntry>> {
        (**self).query(query).await
    }

    async fn mark_posted(&self, journal_number: &str) -> StoreResult<JournalEntry> {
        (**self).mark_posted(journal_number).await
    }

    async fn find_reversal(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        (**self).find_reversal(journal_number).await
    }
}
