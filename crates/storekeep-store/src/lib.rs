//! Storekeep Store - SQLite persistence for the versioned store catalog
//!
//! This crate provides:
//! - Connection pool and pragma setup (`db`)
//! - Embedded, checksummed schema migrations
//! - Repository SQL for `stores` and `store_versions`
//! - `SqliteBackend`, the transactional `StoreBackend` implementation
//! - Conflict retry with exponential backoff

pub mod backend;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod retry;

pub use backend::SqliteBackend;
pub use db::DatabaseConfig;
pub use errors::Result;
pub use retry::RetryPolicy;
