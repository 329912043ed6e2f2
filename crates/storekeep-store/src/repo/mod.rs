//! Repository layer for persisting the domain model to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
