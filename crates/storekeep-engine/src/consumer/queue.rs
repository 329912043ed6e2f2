//! Delivery queue boundary
//!
//! `MessageQueue` is the seam to the message broker. `MemoryQueue` is the
//! in-process implementation: a bounded channel for new deliveries plus an
//! unbounded one for redeliveries, so a worker requeueing a message never
//! blocks behind a full intake.

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use storekeep_core::errors::{ExError, ExErrorKind, Result};

/// One delivery handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub delivery_tag: u64,
    pub body: Vec<u8>,
    /// How many times this message was requeued before this delivery
    pub redelivered: u32,
}

/// Broker-facing queue operations
///
/// Every received message must be settled exactly once with `ack`,
/// `requeue` or `reject`.
pub trait MessageQueue: Send + Sync {
    /// Enqueue a new message, blocking while the queue is full
    ///
    /// Returns the delivery tag.
    fn publish(&self, body: Vec<u8>) -> Result<u64>;

    /// Next delivery, or `None` if nothing arrived within `timeout`
    fn receive(&self, timeout: Duration) -> Option<InboundMessage>;

    fn ack(&self, msg: &InboundMessage);

    /// Hand the message back for another delivery
    fn requeue(&self, msg: InboundMessage) -> Result<()>;

    /// Drop the message without redelivery
    fn reject(&self, msg: &InboundMessage);

    /// Stop accepting new messages; queued ones are still delivered
    fn close(&self);

    /// Closed and every published message settled
    fn is_drained(&self) -> bool;
}

fn queue_closed() -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op("publish")
        .with_message("queue is closed")
}

/// In-process queue over `crossbeam-channel`
pub struct MemoryQueue {
    intake_tx: Sender<InboundMessage>,
    intake_rx: Receiver<InboundMessage>,
    redeliver_tx: Sender<InboundMessage>,
    redeliver_rx: Receiver<InboundMessage>,
    next_tag: AtomicU64,
    unsettled: AtomicUsize,
    closed: AtomicBool,
    dead_letters: Mutex<Vec<InboundMessage>>,
}

impl MemoryQueue {
    pub fn new(capacity: usize) -> Self {
        let (intake_tx, intake_rx) = bounded(capacity.max(1));
        let (redeliver_tx, redeliver_rx) = unbounded();
        Self {
            intake_tx,
            intake_rx,
            redeliver_tx,
            redeliver_rx,
            next_tag: AtomicU64::new(1),
            unsettled: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            dead_letters: Mutex::new(Vec::new()),
        }
    }

    /// Messages published but not yet acked or rejected
    pub fn unsettled(&self) -> usize {
        self.unsettled.load(Ordering::SeqCst)
    }

    /// Rejected messages, in rejection order
    pub fn dead_letters(&self) -> Vec<InboundMessage> {
        self.dead_letters
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    fn settle(&self) {
        self.unsettled.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MessageQueue for MemoryQueue {
    fn publish(&self, body: Vec<u8>) -> Result<u64> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(queue_closed());
        }
        let delivery_tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
        self.unsettled.fetch_add(1, Ordering::SeqCst);
        let msg = InboundMessage {
            delivery_tag,
            body,
            redelivered: 0,
        };
        if self.intake_tx.send(msg).is_err() {
            self.settle();
            return Err(queue_closed());
        }
        Ok(delivery_tag)
    }

    fn receive(&self, timeout: Duration) -> Option<InboundMessage> {
        if let Ok(msg) = self.redeliver_rx.try_recv() {
            return Some(msg);
        }
        select! {
            recv(self.redeliver_rx) -> msg => msg.ok(),
            recv(self.intake_rx) -> msg => msg.ok(),
            default(timeout) => None,
        }
    }

    fn ack(&self, _msg: &InboundMessage) {
        self.settle();
    }

    fn requeue(&self, mut msg: InboundMessage) -> Result<()> {
        msg.redelivered += 1;
        self.redeliver_tx.send(msg).map_err(|_| {
            ExError::new(ExErrorKind::Internal)
                .with_op("requeue")
                .with_message("redelivery channel disconnected")
        })
    }

    fn reject(&self, msg: &InboundMessage) {
        if let Ok(mut dead) = self.dead_letters.lock() {
            dead.push(msg.clone());
        }
        self.settle();
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_drained(&self) -> bool {
        self.closed.load(Ordering::SeqCst) && self.unsettled() == 0
    }
}
