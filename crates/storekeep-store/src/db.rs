//! Database connection management
//!
//! Opens SQLite connections with the pragmas the store relies on and builds
//! the shared `r2d2` pool used by the backend.

use crate::errors::{from_pool, from_rusqlite, Result};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 250;

/// Database section of the service configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
    /// Maximum pooled connections
    pub pool_size: u32,
    /// How long a writer waits for the write lock before the attempt fails
    /// with `Conflict`
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storekeep.db"),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DatabaseConfig {
    /// Config for a database file with default pool settings
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

fn apply_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    // journal_mode reports the resulting mode as a row
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// Configure a connection: foreign keys on, WAL journal, busy timeout
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    apply_pragmas(conn, busy_timeout).map_err(from_rusqlite)
}

/// Build the connection pool described by `config`
///
/// Every connection handed out by the pool has been configured with
/// `configure`.
pub fn build_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let busy_timeout = config.busy_timeout();
    let manager = SqliteConnectionManager::file(&config.path)
        .with_init(move |conn| apply_pragmas(conn, busy_timeout));

    r2d2::Pool::builder()
        .max_size(config.pool_size.max(1))
        .build(manager)
        .map_err(from_pool)
}
