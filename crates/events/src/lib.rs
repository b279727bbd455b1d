//! Ledger notifications: the event trait and an in-process bus.
//!
//! The journal store is the source of truth; events published here only tell
//! interested collaborators that something was committed.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
