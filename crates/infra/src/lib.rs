//! Infrastructure layer: storage adapters, configuration, the posting engine and
//! the reporting service.
//!
//! Every store comes in two flavours behind one trait: an in-memory adapter for
//! tests and embedding, and a Postgres adapter ([`PgLedgerStore`]) for production.

pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod journal;
pub mod outbox;
pub mod postgres;
pub mod registry;
pub mod reporting;
pub mod sequence;

mod integration_tests;

pub use config::{DatabaseConfig, LedgerConfig, PostingConfig, SequencesConfig};
pub use documents::{DocumentSource, InMemoryDocumentSource};
pub use engine::{DefaultBus, EngineSettings, InMemoryLedgerEngine, LedgerEngine};
pub use error::{StoreError, StoreResult};
pub use journal::{InMemoryJournalStore, JournalQuery, JournalStore};
pub use outbox::{
    DeadLetter, FailurePolicy, OutboxOutcome, PendingId, PendingPosting, PostingOutbox,
    RetryReport,
};
pub use postgres::PgLedgerStore;
pub use registry::{AccountRegistry, InMemoryAccountRegistry};
pub use reporting::ReportingService;
pub use sequence::{InMemorySequenceStore, SequenceStore};
