//! # Bounded, suspending queue with a shared terminating stream.
//!
//! Thin wrapper over [`tokio::sync::mpsc`] adding the two capabilities the
//! manager needs on top of a plain channel:
//!
//! - a **terminator**: `close()` ends the queue without waiting on producers
//!   or consumers; blocked pushers wake with [`QueueClosed`], the consumer
//!   stream drains buffered items and ends.
//! - a **shared consumer side**: the receiver sits behind an async mutex so
//!   the lazy stream and the best-effort drain can coexist.
//!
//! ## Rules
//! - `push` suspends while the queue is full (this is the backpressure seam)
//!   and aborts promptly when the queue closes.
//! - `stream()` yields items in FIFO order and terminates after the close,
//!   once buffered items are drained.
//! - `drain_up_to` never waits: it reports `None` when the queue is closed or
//!   the receiver is currently held by a parked stream consumer, and an empty
//!   vector when the queue is simply empty.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Marker error: the queue was closed.
///
/// A runner hitting it treats the push as a no-op and winds down without
/// emitting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueClosed;

/// Bounded FIFO queue: suspending producers, shared terminating consumer.
pub(crate) struct BoundedQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
    done: CancellationToken,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
            done: self.done.clone(),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items (clamped to 1).
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            done: CancellationToken::new(),
        }
    }

    /// Closes the queue. Idempotent, never blocks.
    pub(crate) fn close(&self) {
        self.done.cancel();
    }

    /// Drains up to `max` buffered items without waiting.
    ///
    /// Returns `None` when the queue is closed or its receiver is currently
    /// held by a parked stream consumer; `Some(vec![])` when merely empty.
    pub(crate) fn drain_up_to(&self, max: usize) -> Option<Vec<T>> {
        if self.done.is_cancelled() {
            return None;
        }
        let mut rx = self.rx.try_lock().ok()?;
        let mut items = Vec::new();
        while items.len() < max {
            match rx.try_recv() {
                Ok(item) => items.push(item),
                Err(_) => break,
            }
        }
        Some(items)
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Enqueues one item, suspending while the queue is full.
    ///
    /// Returns [`QueueClosed`] if the queue is closed before or while
    /// waiting for space.
    pub(crate) async fn push(&self, item: T) -> Result<(), QueueClosed> {
        if self.done.is_cancelled() {
            return Err(QueueClosed);
        }
        tokio::select! {
            _ = self.done.cancelled() => Err(QueueClosed),
            sent = self.tx.send(item) => sent.map_err(|_| QueueClosed),
        }
    }

    /// Lazy FIFO stream over the queue's items.
    ///
    /// Terminates once the queue is closed and buffered items are exhausted.
    /// Concurrent stream instances compete for items; each item is delivered
    /// to exactly one of them.
    pub(crate) fn stream(&self) -> impl Stream<Item = T> + Send {
        let rx = Arc::clone(&self.rx);
        let done = self.done.clone();
        async_stream::stream! {
            loop {
                let next = {
                    let mut rx = rx.lock().await;
                    match rx.try_recv() {
                        Ok(item) => Some(item),
                        Err(mpsc::error::TryRecvError::Disconnected) => None,
                        Err(mpsc::error::TryRecvError::Empty) => {
                            if done.is_cancelled() {
                                None
                            } else {
                                tokio::select! {
                                    _ = done.cancelled() => None,
                                    item = rx.recv() => item,
                                }
                            }
                        }
                    }
                };
                match next {
                    Some(item) => yield item,
                    None => break,
                }
            }
        }
    }
}
