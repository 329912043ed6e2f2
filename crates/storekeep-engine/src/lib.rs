//! Storekeep Engine - Orchestration layer
//!
//! Coordinates the domain rules in `storekeep-core` with the SQLite backend:
//! - `service`: the version lifecycle manager
//! - `commands`: envelope decoding and the command dispatcher
//! - `consumer`: the delivery queue, settlement policy and worker pool
//! - `config`: service configuration loaded from TOML and the environment

pub mod commands;
pub mod config;
pub mod consumer;
pub mod service;

pub use commands::{DispatchOutcome, Dispatcher};
pub use config::ServiceConfig;
pub use consumer::{Consumer, ConsumerStats, MemoryQueue, MessageQueue};
pub use service::StoreService;
