//! Publishing side of ledger notifications.
//!
//! Delivery is best-effort. A bus keeps no history, so a listener that misses a
//! message re-reads the journal instead.

use std::sync::mpsc::Receiver;

/// Announces committed ledger changes; called from many request handlers at once.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Hands `message` to every live listener and returns how many received it.
    fn publish(&self, message: M) -> Result<usize, Self::Error>;
}

/// Listener handed out by a bus. It only sees messages published after it was opened.
#[derive(Debug)]
pub struct Subscription<M>(Receiver<M>);

impl<M> Subscription<M> {
    pub(crate) fn new(receiver: Receiver<M>) -> Self {
        Self(receiver)
    }

    /// Next queued message, if any.
    pub fn try_next(&self) -> Option<M> {
        self.0.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<M> {
        self.0.try_iter().collect()
    }
}
