use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use booksmith_accounting::{EntryStatus, JournalEntry, PreparedEntry, SequenceKey, SequenceSettings};

use super::{JournalQuery, JournalStore};
use crate::error::{StoreError, StoreResult};
use crate::sequence::InMemorySequenceStore;

/// Entries in insertion order, indexed by journal number and by reversal target.
#[derive(Debug, Default)]
struct JournalRows {
    entries: Vec<JournalEntry>,
    by_number: HashMap<String, usize>,
    reversed_by: HashMap<String, usize>,
}

impl JournalRows {
    fn push(&mut self, entry: JournalEntry) {
        let at = self.entries.len();
        self.by_number.insert(entry.journal_number.clone(), at);
        if let Some(original) = &entry.reversal_of {
            self.reversed_by.insert(original.clone(), at);
        }
        self.entries.push(entry);
    }
}

/// In-memory append-only journal.
///
/// Shares its [`InMemorySequenceStore`] with the engine so that numbering and insertion
/// happen under the same lock. Intended for tests/dev.
#[derive(Debug)]
pub struct InMemoryJournalStore {
    sequences: Arc<InMemorySequenceStore>,
    rows: RwLock<JournalRows>,
}

impl InMemoryJournalStore {
    pub fn new(sequences: Arc<InMemorySequenceStore>) -> Self {
        Self {
            sequences,
            rows: RwLock::new(JournalRows::default()),
        }
    }

    pub fn sequences(&self) -> &Arc<InMemorySequenceStore> {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl JournalStore for InMemoryJournalStore {
    async fn append(
        &self,
        key: &SequenceKey,
        settings: &SequenceSettings,
        entry: PreparedEntry,
        status: EntryStatus,
    ) -> StoreResult<JournalEntry> {
        self.sequences.issue_with(key, settings, |issued| {
            let mut rows = self.rows.write().map_err(|_| StoreError::poisoned("journal"))?;

            if rows.by_number.contains_key(&issued.formatted) {
                return Err(StoreError::Conflict(format!(
                    "journal number {} already exists",
                    issued.formatted
                )));
            }
            if let Some(original) = &entry.reversal_of {
                if rows.reversed_by.contains_key(original) {
                    return Err(StoreError::Conflict(format!("{original} is already reversed")));
                }
            }

            let stored = entry.into_entry(issued.formatted.clone(), status, Utc::now());
            rows.push(stored.clone());
            Ok(stored)
        })
    }

    async fn get(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned("journal"))?;
        Ok(rows
            .by_number
            .get(journal_number)
            .map(|&at| rows.entries[at].clone()))
    }

    async fn query(&self, query: &JournalQuery) -> StoreResult<Vec<JournalEntry>> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned("journal"))?;
        let mut found: Vec<JournalEntry> = rows.entries.iter().filter(|e| query.matches(e)).cloned().collect();
        drop(rows);

        found.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.journal_number.cmp(&b.journal_number))
        });
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn mark_posted(&self, journal_number: &str) -> StoreResult<JournalEntry> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned("journal"))?;
        let at = *rows
            .by_number
            .get(journal_number)
            .ok_or_else(|| StoreError::NotFound(journal_number.to_string()))?;
        let entry = &mut rows.entries[at];
        if entry.status == EntryStatus::Posted {
            return Err(StoreError::Conflict(format!("{journal_number} is already posted")));
        }
        entry.status = EntryStatus::Posted;
        Ok(entry.clone())
    }

    async fn find_reversal(&self, journal_number: &str) -> StoreResult<Option<JournalEntry>> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned("journal"))?;
        Ok(rows
            .reversed_by
            .get(journal_number)
            .map(|&at| rows.entries[at].clone()))
    }
}
