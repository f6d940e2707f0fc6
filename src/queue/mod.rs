//! Terminable queues backing the shared streams.
//!
//! Two flavors with deliberately different overflow behavior:
//! - [`BoundedQueue`] - bounded, **suspending** on full. Backpressure for
//!   notification producers: a job that outruns its consumers parks at the
//!   next push until space frees up.
//! - [`RingQueue`] - bounded, **oldest-dropping**. Event loss is tolerable;
//!   stalling runner teardown is not, so event pushes never block.
//!
//! Both are terminable: `close()` cancels the queue's token (the
//! end-of-stream marker), after which consumers drain what is buffered and
//! terminate, producers fail or no-op, and the drain facility reports the
//! queue as gone. Closing never blocks, regardless of queue fullness or
//! consumer speed.

mod bounded;
mod ring;

pub(crate) use bounded::{BoundedQueue, QueueClosed};
pub(crate) use ring::RingQueue;
