//! Storekeep Core - domain kernel of the versioned store catalog
//!
//! This crate provides:
//! - Store and StoreVersion models with their command payloads
//! - Field validation rules
//! - The `StoreBackend` persistence contract
//! - The canonical error facility (`ExError`, `ExErrorKind`, `DomainError`)
//! - The structured logging facility and its macros

pub mod backend;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;

pub use storekeep_core_types::schema;

// Re-export commonly used types
pub use backend::StoreBackend;
pub use errors::{DomainError, ExError, ExErrorKind, Result};
pub use model::{NewStore, NewStoreVersion, Store, StoreFields, StoreVersion, VersionFields};
