//! Consumer worker pool
//!
//! `workers` named threads share one queue. Each pulls a delivery, dispatches
//! it to completion and settles it before taking the next one. Writers to the
//! same store serialize in the database, not here.

use crate::commands::{DispatchOutcome, Dispatcher};
use crate::config::ConsumerConfig;
use crate::consumer::queue::{InboundMessage, MessageQueue};
use crate::consumer::settlement::{settle, Settlement};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use storekeep_core::errors::{ExError, ExErrorKind, Result};
use storekeep_core::StoreBackend;
use storekeep_core_types::RequestContext;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Settlement totals for one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub acked: u64,
    pub requeued: u64,
    pub rejected: u64,
    /// Unknown actions; also acknowledged
    pub ignored: u64,
}

#[derive(Default)]
struct Counters {
    acked: AtomicU64,
    requeued: AtomicU64,
    rejected: AtomicU64,
    ignored: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ConsumerStats {
        ConsumerStats {
            acked: self.acked.load(Ordering::SeqCst),
            requeued: self.requeued.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            ignored: self.ignored.load(Ordering::SeqCst),
        }
    }
}

/// Worker pool draining a `MessageQueue` through a `Dispatcher`
pub struct Consumer<B: StoreBackend + 'static, Q: MessageQueue + 'static> {
    dispatcher: Arc<Dispatcher<B>>,
    queue: Arc<Q>,
    workers: usize,
    max_redeliveries: u32,
}

impl<B: StoreBackend + 'static, Q: MessageQueue + 'static> Consumer<B, Q> {
    pub fn new(dispatcher: Arc<Dispatcher<B>>, queue: Arc<Q>, config: &ConsumerConfig) -> Self {
        Self {
            dispatcher,
            queue,
            workers: config.workers.max(1),
            max_redeliveries: config.max_redeliveries,
        }
    }

    /// Process deliveries until the queue is closed and drained
    ///
    /// # Errors
    ///
    /// `Internal` if a worker thread cannot be spawned or panics.
    pub fn run(&self) -> Result<ConsumerStats> {
        let counters = Arc::new(Counters::default());
        let mut handles = Vec::with_capacity(self.workers);

        for idx in 0..self.workers {
            let dispatcher = Arc::clone(&self.dispatcher);
            let queue = Arc::clone(&self.queue);
            let counters = Arc::clone(&counters);
            let max_redeliveries = self.max_redeliveries;
            let handle = thread::Builder::new()
                .name(format!("storekeep-worker-{idx}"))
                .spawn(move || {
                    worker_loop(&*dispatcher, &*queue, &counters, max_redeliveries)
                })
                .map_err(|e| {
                    ExError::new(ExErrorKind::Internal)
                        .with_op("spawn_worker")
                        .with_message(e.to_string())
                })?;
            handles.push(handle);
        }
        tracing::info!(workers = self.workers, "Consumer started");

        let mut panicked = 0;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            return Err(ExError::new(ExErrorKind::Internal)
                .with_op("consume")
                .with_message(format!("{} worker thread(s) panicked", panicked)));
        }

        let stats = counters.snapshot();
        tracing::info!(
            acked = stats.acked,
            requeued = stats.requeued,
            rejected = stats.rejected,
            ignored = stats.ignored,
            "Consumer drained"
        );
        Ok(stats)
    }
}

fn worker_loop<B: StoreBackend, Q: MessageQueue + ?Sized>(
    dispatcher: &Dispatcher<B>,
    queue: &Q,
    counters: &Counters,
    max_redeliveries: u32,
) {
    while !queue.is_drained() {
        let Some(msg) = queue.receive(POLL_INTERVAL) else {
            continue;
        };
        let ctx = RequestContext::new().with_delivery_tag(msg.delivery_tag);
        let outcome = dispatcher.dispatch(&msg.body, &ctx);
        apply_settlement(queue, msg, &outcome, counters, max_redeliveries);
    }
}

fn apply_settlement<Q: MessageQueue + ?Sized>(
    queue: &Q,
    msg: InboundMessage,
    outcome: &DispatchOutcome,
    counters: &Counters,
    max_redeliveries: u32,
) {
    let delivery_tag = msg.delivery_tag;
    match settle(outcome, msg.redelivered, max_redeliveries) {
        Settlement::Ack => {
            queue.ack(&msg);
            if matches!(outcome, DispatchOutcome::Ignored { .. }) {
                counters.ignored.fetch_add(1, Ordering::SeqCst);
            } else {
                counters.acked.fetch_add(1, Ordering::SeqCst);
            }
        }
        Settlement::Requeue => {
            let redelivered = msg.redelivered;
            match queue.requeue(msg.clone()) {
                Ok(()) => {
                    counters.requeued.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(delivery_tag, redelivered, "Delivery requeued");
                }
                Err(err) => {
                    tracing::error!(delivery_tag, error = %err, "Requeue failed, rejecting");
                    queue.reject(&msg);
                    counters.rejected.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        Settlement::Reject => {
            queue.reject(&msg);
            counters.rejected.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(
                delivery_tag,
                redelivered = msg.redelivered,
                "Delivery rejected"
            );
        }
    }
}
