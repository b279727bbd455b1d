use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are facts about committed state: immutable, versioned, append-only.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "accounting.journal.recorded").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event happened (wall-clock commit time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
