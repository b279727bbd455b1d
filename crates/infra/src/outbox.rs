//! Posting outbox: what happens when a business event's posting fails.
//!
//! With [`FailurePolicy::Reject`] the error goes straight back to the collaborator,
//! which must refuse its finalize step. With [`FailurePolicy::Queue`] failures that a
//! later attempt could fix (contention, storage, a missing account) are kept as
//! pending postings; [`PostingOutbox::retry_pending`] re-attempts them and moves
//! exhausted ones to a dead-letter list.
//!
//! Both lists live in process memory only and are lost on restart. A caller that
//! shuts down cleanly takes them with [`PostingOutbox::take_unsettled`] and stores the
//! serialized postings itself; an outbox dropped while still holding postings logs
//! them at error level.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use booksmith_accounting::{BusinessEvent, JournalEntry, LedgerError, LedgerEvent, LedgerResult};
use booksmith_core::UserId;
use booksmith_events::EventBus;

use crate::config::PostingConfig;
use crate::engine::{DefaultBus, LedgerEngine};
use crate::journal::JournalStore;
use crate::registry::AccountRegistry;
use crate::sequence::SequenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Return the posting error to the caller.
    #[default]
    Reject,
    /// Keep retryable failures for a later [`PostingOutbox::retry_pending`].
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingId(pub Uuid);

impl PendingId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PendingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PendingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A business event whose posting has not succeeded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPosting {
    pub id: PendingId,
    pub event: BusinessEvent,
    pub author: UserId,
    pub attempts: u32,
    pub last_error: String,
    pub queued_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub posting: PendingPosting,
    pub dead_lettered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboxOutcome {
    Posted(JournalEntry),
    /// Kept for retry.
    Queued(PendingId),
    /// Failed with no attempts left; see [`PostingOutbox::dead_letters`].
    DeadLettered(PendingId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryReport {
    pub posted: Vec<JournalEntry>,
    pub still_pending: usize,
    pub dead_lettered: usize,
}

/// Failures a later attempt might get past without changing the event.
fn retryable(err: &LedgerError) -> bool {
    err.is_transient() || matches!(err, LedgerError::AccountNotFound { .. })
}

fn guard<'a, T>(mutex: &'a Mutex<T>, what: &str) -> LedgerResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| LedgerError::storage(format!("{what} lock poisoned")))
}

#[derive(Debug)]
pub struct PostingOutbox<R, S, J, B = DefaultBus> {
    engine: Arc<LedgerEngine<R, S, J, B>>,
    policy: FailurePolicy,
    max_attempts: u32,
    pending: Mutex<Vec<PendingPosting>>,
    dead: Mutex<Vec<DeadLetter>>,
}

impl<R, S, J, B> PostingOutbox<R, S, J, B>
where
    R: AccountRegistry,
    S: SequenceStore,
    J: JournalStore,
    B: EventBus<LedgerEvent>,
{
    pub fn new(engine: Arc<LedgerEngine<R, S, J, B>>, policy: FailurePolicy, max_attempts: u32) -> Self {
        Self {
            engine,
            policy,
            max_attempts: max_attempts.max(1),
            pending: Mutex::new(Vec::new()),
            dead: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(engine: Arc<LedgerEngine<R, S, J, B>>, config: &PostingConfig) -> Self {
        Self::new(engine, config.failure_policy, config.max_attempts)
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Post `event` now; on failure apply the configured policy.
    pub async fn submit(&self, event: BusinessEvent, author: UserId) -> LedgerResult<OutboxOutcome> {
        let err = match self.engine.post_event(&event, author).await {
            Ok(entry) => return Ok(OutboxOutcome::Posted(entry)),
            Err(err) => err,
        };
        if self.policy == FailurePolicy::Reject || !retryable(&err) {
            return Err(err);
        }

        let now = Utc::now();
        let posting = PendingPosting {
            id: PendingId::new(),
            event,
            author,
            attempts: 1,
            last_error: err.to_string(),
            queued_at: now,
            last_attempt_at: now,
        };
        let id = posting.id;
        if posting.attempts >= self.max_attempts {
            self.dead_letter(posting)?;
            return Ok(OutboxOutcome::DeadLettered(id));
        }

        warn!(
            pending_id = %id,
            kind = posting.event.kind(),
            reference = posting.event.reference(),
            error = %err,
            "posting queued for retry"
        );
        guard(&self.pending, "outbox")?.push(posting);
        Ok(OutboxOutcome::Queued(id))
    }

    /// Re-attempt every pending posting once.
    pub async fn retry_pending(&self) -> LedgerResult<RetryReport> {
        let batch = std::mem::take(&mut *guard(&self.pending, "outbox")?);
        let mut report = RetryReport::default();
        let mut keep = Vec::new();

        for mut posting in batch {
            match self.engine.post_event(&posting.event, posting.author).await {
                Ok(entry) => {
                    info!(
                        pending_id = %posting.id,
                        journal_number = %entry.journal_number,
                        attempts = posting.attempts + 1,
                        "queued posting succeeded"
                    );
                    report.posted.push(entry);
                }
                Err(err) => {
                    posting.attempts += 1;
                    posting.last_error = err.to_string();
                    posting.last_attempt_at = Utc::now();
                    if !retryable(&err) || posting.attempts >= self.max_attempts {
                        self.dead_letter(posting)?;
                        report.dead_lettered += 1;
                    } else {
                        keep.push(posting);
                    }
                }
            }
        }

        report.still_pending = keep.len();
        guard(&self.pending, "outbox")?.extend(keep);
        Ok(report)
    }

    fn dead_letter(&self, posting: PendingPosting) -> LedgerResult<()> {
        error!(
            pending_id = %posting.id,
            kind = posting.event.kind(),
            reference = posting.event.reference(),
            attempts = posting.attempts,
            error = %posting.last_error,
            "posting dead-lettered"
        );
        guard(&self.dead, "dead letters")?.push(DeadLetter {
            posting,
            dead_lettered_at: Utc::now(),
        });
        Ok(())
    }

    pub fn pending(&self) -> LedgerResult<Vec<PendingPosting>> {
        Ok(guard(&self.pending, "outbox")?.clone())
    }

    pub fn dead_letters(&self) -> LedgerResult<Vec<DeadLetter>> {
        Ok(guard(&self.dead, "dead letters")?.clone())
    }

    /// Move a dead letter back to pending with a fresh attempt budget.
    pub fn requeue(&self, id: PendingId) -> LedgerResult<bool> {
        let mut dead = guard(&self.dead, "dead letters")?;
        let Some(pos) = dead.iter().position(|d| d.posting.id == id) else {
            return Ok(false);
        };
        let mut posting = dead.remove(pos).posting;
        drop(dead);

        posting.attempts = 0;
        guard(&self.pending, "outbox")?.push(posting);
        Ok(true)
    }

    /// Empty both lists, handing their contents to the caller for safekeeping.
    pub fn take_unsettled(&self) -> LedgerResult<(Vec<PendingPosting>, Vec<DeadLetter>)> {
        let pending = std::mem::take(&mut *guard(&self.pending, "outbox")?);
        let dead = std::mem::take(&mut *guard(&self.dead, "dead letters")?);
        Ok((pending, dead))
    }

    /// Drop a dead letter for good, returning it.
    pub fn discard(&self, id: PendingId) -> LedgerResult<Option<DeadLetter>> {
        let mut dead = guard(&self.dead, "dead letters")?;
        let found = dead.iter().position(|d| d.posting.id == id).map(|pos| dead.remove(pos));
        if let Some(letter) = &found {
            warn!(pending_id = %letter.posting.id, "dead-lettered posting discarded");
        }
        Ok(found)
    }
}

impl<R, S, J, B> Drop for PostingOutbox<R, S, J, B> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().map(|p| p.len()).unwrap_or_default();
        let dead = self.dead.get_mut().map(|d| d.len()).unwrap_or_default();
        if pending + dead > 0 {
            error!(pending, dead_letters = dead, "outbox dropped with unsettled postings");
        }
    }
}
