//! # Dispatcher: bounded-concurrency runner execution.
//!
//! Consumes boxed runner futures from the dispatch queue and drives up to
//! `concurrency` of them in parallel.
//!
//! ## Rules
//! - A semaphore permit is acquired **before** pulling the next runner, so a
//!   saturated manager leaves queued jobs untouched in the channel and
//!   visibly `Pending` in the registry.
//! - On shutdown the dispatcher stops pulling, drops the queue (runners that
//!   never started simply never start), and drains in-flight runners to
//!   completion.
//! - Runners produce no output and swallow their own failures; nothing a job
//!   does can take the dispatcher down.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::{
    sync::{mpsc, Semaphore},
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

/// Boxed runner future as carried by the dispatch queue.
pub(crate) type BoxRunFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub(crate) struct Dispatcher {
    work: mpsc::Receiver<BoxRunFuture>,
    concurrency: usize,
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Spawns the dispatcher loop onto the runtime.
    pub(crate) fn spawn(
        work: mpsc::Receiver<BoxRunFuture>,
        concurrency: usize,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(
            Dispatcher {
                work,
                concurrency,
                shutdown,
            }
            .run(),
        )
    }

    async fn run(mut self) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut inflight = JoinSet::new();

        loop {
            // reap finished runners without blocking
            while inflight.try_join_next().is_some() {}

            let permit = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break,
                },
            };
            let runner = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                item = self.work.recv() => match item {
                    Some(runner) => runner,
                    None => break,
                },
            };
            inflight.spawn(async move {
                runner.await;
                drop(permit);
            });
        }

        tracing::debug!("dispatcher draining in-flight runners");
        while inflight.join_next().await.is_some() {}
    }
}
