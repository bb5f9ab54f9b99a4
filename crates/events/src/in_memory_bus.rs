//! Process-local bus that carries migration envelopes from the publisher
//! to whoever watches a run (audit listeners, the CLI report).

use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    /// A subscriber list mutation panicked mid-run.
    #[error("event bus subscriber list is poisoned")]
    Poisoned,
}

/// Fans each published message out to every live subscription.
///
/// Publishing happens on migration workers, so it never blocks: each
/// subscriber gets its own unbounded queue. A listener that stops watching
/// (drops its [`Subscription`]) is forgotten on the next publish. Listeners
/// only see messages published after they subscribed.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        subs.retain(|tx| tx.send(message.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still yields a subscription; it just never receives.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}
