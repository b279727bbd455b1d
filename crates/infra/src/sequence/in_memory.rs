use std::collections::HashMap;
use std::sync::Mutex;

use booksmith_accounting::{IssuedNumber, SequenceKey, SequenceSettings, VoucherSequence};

use super::SequenceStore;
use crate::error::{StoreError, StoreResult};

/// Sequence rows behind one mutex. The mutex is the row lock.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    rows: Mutex<HashMap<SequenceKey, VoucherSequence>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next number and run `commit` with it while the row is locked.
    ///
    /// The counter only advances when `commit` succeeds, so a failing caller leaves
    /// the sequence exactly as it found it.
    pub(crate) fn issue_with<T>(
        &self,
        key: &SequenceKey,
        settings: &SequenceSettings,
        commit: impl FnOnce(&IssuedNumber) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::poisoned("sequences"))?;
        // Work on a copy; the row is written back only after `commit` succeeds.
        let mut row = rows
            .get(key)
            .cloned()
            .unwrap_or_else(|| VoucherSequence::seeded(key, settings));

        let issued = IssuedNumber {
            key: key.clone(),
            sequence: row.next_number,
            formatted: row.format(row.next_number),
        };
        let out = commit(&issued)?;
        row.next_number += 1;
        rows.insert(key.clone(), row);
        Ok(out)
    }
}

#[async_trait::async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn next_value(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<IssuedNumber> {
        self.issue_with(key, settings, |issued| Ok(issued.clone()))
    }

    async fn peek(&self, key: &SequenceKey) -> StoreResult<Option<VoucherSequence>> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::poisoned("sequences"))?;
        Ok(rows.get(key).cloned())
    }

    async fn reset(&self, key: &SequenceKey) -> StoreResult<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::poisoned("sequences"))?;
        if let Some(row) = rows.get_mut(key) {
            row.next_number = 1;
        }
        Ok(())
    }

    async fn configure(&self, key: &SequenceKey, settings: &SequenceSettings) -> StoreResult<VoucherSequence> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::poisoned("sequences"))?;
        let row = rows
            .entry(key.clone())
            .or_insert_with(|| VoucherSequence::seeded(key, settings));
        row.prefix = settings.prefix.clone();
        row.padding = settings.padding;
        Ok(row.clone())
    }
}
