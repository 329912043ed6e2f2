//! Message consumption: queue boundary, settlement policy, worker pool

pub mod queue;
pub mod settlement;
pub mod worker;

pub use queue::{InboundMessage, MemoryQueue, MessageQueue};
pub use settlement::{settle, settle_error, Settlement};
pub use worker::{Consumer, ConsumerStats};
