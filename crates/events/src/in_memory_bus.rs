//! Process-local fan-out over std mpsc channels.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// A publisher panicked while holding the listener list.
    Poisoned,
}

/// Clones are handles to the same listener list. Listeners whose
/// [`Subscription`] was dropped are pruned on the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    listeners: Arc<Mutex<Vec<Sender<M>>>>,
}

impl<M> Clone for InMemoryEventBus<M> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription::new(rx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        let mut listeners = self
            .listeners
            .lock()
            .map_err(|_| InMemoryBusError::Poisoned)?;
        listeners.retain(|tx| tx.send(message.clone()).is_ok());
        Ok(listeners.len())
    }
}
