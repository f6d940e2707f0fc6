//! # Oldest-dropping ring queue for lifecycle events.
//!
//! A bounded `VecDeque` behind a plain mutex, with a [`Notify`] to wake the
//! consumer and a cancellation token as the terminator.
//!
//! ## Rules
//! - `push` is synchronous and never blocks: at capacity, the **oldest**
//!   element is discarded to make room. Runner teardown must not stall on a
//!   slow or absent event consumer.
//! - `stream()` delivers items in FIFO order and terminates once the queue
//!   is closed and drained.
//! - The mutex guards only queue mutations; it is never held across an await.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use futures::Stream;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct RingInner<T> {
    buf: Mutex<VecDeque<T>>,
    capacity: usize,
    notify: Notify,
    done: CancellationToken,
}

impl<T> RingInner<T> {
    fn pop(&self) -> Option<T> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Bounded FIFO queue that discards the oldest item on overflow.
pub(crate) struct RingQueue<T> {
    inner: Arc<RingInner<T>>,
}

impl<T> Clone for RingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RingQueue<T> {
    /// Creates a ring holding at most `capacity` items (clamped to 1).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RingInner {
                buf: Mutex::new(VecDeque::new()),
                capacity: capacity.max(1),
                notify: Notify::new(),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Closes the ring. Idempotent, never blocks.
    pub(crate) fn close(&self) {
        self.inner.done.cancel();
    }

    /// Drains up to `max` buffered items without waiting.
    ///
    /// Returns `None` once the ring is closed; `Some(vec![])` when merely
    /// empty.
    pub(crate) fn drain_up_to(&self, max: usize) -> Option<Vec<T>> {
        if self.inner.done.is_cancelled() {
            return None;
        }
        let mut buf = self
            .inner
            .buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let n = max.min(buf.len());
        Some(buf.drain(..n).collect())
    }
}

impl<T: Send + 'static> RingQueue<T> {
    /// Enqueues one item, discarding the oldest buffered item if full.
    ///
    /// Never blocks. A push after `close()` is a silent no-op.
    pub(crate) fn push(&self, item: T) {
        if self.inner.done.is_cancelled() {
            return;
        }
        {
            let mut buf = self
                .inner
                .buf
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if buf.len() >= self.inner.capacity {
                buf.pop_front();
            }
            buf.push_back(item);
        }
        self.inner.notify.notify_one();
    }

    /// Lazy FIFO stream over the ring's items.
    ///
    /// Terminates once the ring is closed and buffered items are exhausted.
    pub(crate) fn stream(&self) -> impl Stream<Item = T> + Send {
        let inner = Arc::clone(&self.inner);
        async_stream::stream! {
            loop {
                if let Some(item) = inner.pop() {
                    yield item;
                    continue;
                }
                if inner.done.is_cancelled() {
                    break;
                }
                let notified = inner.notify.notified();
                tokio::select! {
                    _ = inner.done.cancelled() => {
                        while let Some(item) = inner.pop() {
                            yield item;
                        }
                        break;
                    }
                    _ = notified => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn overflow_discards_oldest() {
        let q = RingQueue::new(1);
        q.push("old");
        q.push("new");
        assert_eq!(q.drain_up_to(8), Some(vec!["new"]));
    }

    #[test]
    fn capacity_two_keeps_newest_pair() {
        let q = RingQueue::new(2);
        for n in 1..=4 {
            q.push(n);
        }
        assert_eq!(q.drain_up_to(8), Some(vec![3, 4]));
    }

    #[tokio::test]
    async fn stream_sees_items_pushed_before_and_after_subscribe() {
        let q = RingQueue::new(8);
        q.push(1);

        let collector = {
            let q = q.clone();
            tokio::spawn(async move { q.stream().collect::<Vec<i32>>().await })
        };

        q.push(2);
        q.push(3);
        q.close();

        assert_eq!(collector.await.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn drain_distinguishes_empty_from_closed() {
        let q = RingQueue::new(2);
        assert_eq!(q.drain_up_to(8), Some(vec![]));
        q.push(5);
        assert_eq!(q.drain_up_to(8), Some(vec![5]));
        q.close();
        assert_eq!(q.drain_up_to(8), None::<Vec<i32>>);
    }

    #[test]
    fn push_after_close_is_noop() {
        let q = RingQueue::new(2);
        q.close();
        q.push(1);
        assert_eq!(q.drain_up_to(8), None::<Vec<i32>>);
    }
}
