//! Notifications published after ledger changes commit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_core::EntryId;
use booksmith_events::Event;

use crate::journal::{EntryStatus, JournalEntry};

/// Event: a journal entry was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecorded {
    pub entry_id: EntryId,
    pub journal_number: String,
    pub entry_date: NaiveDate,
    pub reference: String,
    pub status: EntryStatus,
    pub total: Decimal,
    pub reversal_of: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a draft entry was approved (draft -> posted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalApproved {
    pub entry_id: EntryId,
    pub journal_number: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    JournalRecorded(JournalRecorded),
    JournalApproved(JournalApproved),
}

impl LedgerEvent {
    pub fn recorded(entry: &JournalEntry) -> Self {
        LedgerEvent::JournalRecorded(JournalRecorded {
            entry_id: entry.id,
            journal_number: entry.journal_number.clone(),
            entry_date: entry.entry_date,
            reference: entry.reference.clone(),
            status: entry.status,
            total: entry.total_debit,
            reversal_of: entry.reversal_of.clone(),
            occurred_at: Utc::now(),
        })
    }

    pub fn approved(entry: &JournalEntry) -> Self {
        LedgerEvent::JournalApproved(JournalApproved {
            entry_id: entry.id,
            journal_number: entry.journal_number.clone(),
            occurred_at: Utc::now(),
        })
    }

    pub fn journal_number(&self) -> &str {
        match self {
            LedgerEvent::JournalRecorded(e) => &e.journal_number,
            LedgerEvent::JournalApproved(e) => &e.journal_number,
        }
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::JournalRecorded(_) => "accounting.journal.recorded",
            LedgerEvent::JournalApproved(_) => "accounting.journal.approved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::JournalRecorded(e) => e.occurred_at,
            LedgerEvent::JournalApproved(e) => e.occurred_at,
        }
    }
}
