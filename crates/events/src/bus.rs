//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes facts that already happened (a material was migrated,
//! ...) to whoever is listening: audit sinks, read-model refreshers,
//! notification senders. Publishers never wait on consumers.
//!
//! - **Transport-agnostic**: in-memory channels, brokers, queues.
//! - **At-least-once**: consumers must tolerate duplicates.
//! - **No persistence**: the bus is for distribution, not storage.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Intended for single-threaded consumption.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => audit.record(event),
///         Err(RecvTimeoutError::Timeout) => continue,
///         Err(RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail (bus poisoned, broker unreachable). Callers decide
/// whether that matters; the migration engine treats publication as
/// fire-and-forget and only logs failures.
///
/// Implementations must be `Send + Sync`: many workers publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
