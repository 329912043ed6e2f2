//! SQLite implementation of the storage backend
//!
//! Every mutating call is one `IMMEDIATE` transaction: the write lock is taken
//! at `BEGIN`, so concurrent writers serialize on the database instead of
//! interleaving reads and writes. A writer that cannot get the lock within the
//! busy timeout fails with `Conflict`; the whole transaction is then re-run
//! under the configured `RetryPolicy`.

use crate::db::{build_pool, DatabaseConfig, PooledConnection, SqlitePool};
use crate::errors::{from_pool, sqlite_op, Result};
use crate::migrations::apply_migrations;
use crate::repo::SqliteRepo;
use crate::retry::RetryPolicy;
use rusqlite::{Transaction, TransactionBehavior};
use storekeep_core::errors::DomainError;
use storekeep_core::model::{NewStore, NewStoreVersion, Store, StoreVersion};
use storekeep_core::StoreBackend;
use uuid::Uuid;

/// Pooled SQLite backend
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl SqliteBackend {
    /// Build the pool and bring the schema up to date
    pub fn open(config: &DatabaseConfig, retry: RetryPolicy) -> Result<Self> {
        let pool = build_pool(config)?;
        let backend = Self::from_pool(pool, retry);
        {
            let mut conn = backend.conn()?;
            apply_migrations(&mut conn)?;
        }
        tracing::debug!(
            path = %config.path.display(),
            pool_size = config.pool_size,
            "SQLite backend ready"
        );
        Ok(backend)
    }

    /// Wrap an existing pool; migrations are the caller's responsibility
    pub fn from_pool(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    fn conn(&self) -> Result<PooledConnection> {
        self.pool.get().map_err(from_pool)
    }

    /// Run `f` inside an immediate transaction, retrying the whole unit on
    /// `Conflict`
    fn write<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: Fn(&Transaction<'_>) -> Result<T>,
    {
        self.retry.run(op, || {
            let mut conn = self.conn()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(sqlite_op(op))?;
            // dropping `tx` on the error path rolls back
            let value = f(&tx)?;
            tx.commit().map_err(sqlite_op(op))?;
            Ok(value)
        })
    }
}

impl StoreBackend for SqliteBackend {
    fn create_store(&self, new_store: &NewStore) -> Result<String> {
        let store_id = Uuid::now_v7().to_string();
        let version_id = Uuid::now_v7().to_string();
        let first_version = NewStoreVersion {
            fields: new_store.fields.version_fields(),
            creator_login: new_store.creator_login.clone(),
            created_at: new_store.created_at,
        };

        self.write("create_store", |tx| {
            SqliteRepo::insert_store(tx, &store_id, new_store)?;
            SqliteRepo::insert_version(tx, &version_id, &store_id, 1, &first_version, true)?;
            Ok(())
        })
        .map_err(|e| e.with_store_id(&store_id))?;

        tracing::debug!(store_id = %store_id, version_id = %version_id, "Store created");
        Ok(store_id)
    }

    fn append_version(
        &self,
        store_id: &str,
        new_version: &NewStoreVersion,
    ) -> Result<StoreVersion> {
        let version = self
            .write("append_version", |tx| {
                let current = SqliteRepo::get_current_version(tx, store_id)?.ok_or_else(|| {
                    DomainError::NoCurrentVersion {
                        store_id: store_id.to_string(),
                    }
                })?;
                SqliteRepo::demote_version(tx, &current.id)?;

                // A writer that waited on the lock may hold an older stamp
                // than the version it now replaces.
                let stamped = NewStoreVersion {
                    created_at: new_version.created_at.max(current.created_at),
                    ..new_version.clone()
                };
                let version_id = Uuid::now_v7().to_string();
                SqliteRepo::insert_version(
                    tx,
                    &version_id,
                    store_id,
                    current.version_number + 1,
                    &stamped,
                    true,
                )
            })
            .map_err(|e| e.with_store_id(store_id))?;

        tracing::debug!(
            store_id,
            version_id = %version.id,
            version_number = version.version_number,
            "Version appended"
        );
        Ok(version)
    }

    fn delete_store(&self, store_id: &str) -> Result<()> {
        let removed_versions = self
            .write("delete_store", |tx| {
                let removed_versions = SqliteRepo::delete_versions_of_store(tx, store_id)?;
                if SqliteRepo::delete_store_row(tx, store_id)? == 0 {
                    return Err(DomainError::StoreNotFound {
                        store_id: store_id.to_string(),
                    }
                    .into());
                }
                Ok(removed_versions)
            })
            .map_err(|e| e.with_store_id(store_id))?;

        tracing::debug!(store_id, removed_versions, "Store deleted");
        Ok(())
    }

    fn delete_version(&self, store_id: &str, version_id: &str) -> Result<()> {
        self.write("delete_version", |tx| {
            let version = SqliteRepo::get_version_for_store(tx, store_id, version_id)?
                .ok_or_else(|| DomainError::VersionNotFound {
                    store_id: store_id.to_string(),
                    version_id: version_id.to_string(),
                })?;
            if version.is_current {
                return Err(DomainError::CurrentVersionDeletion {
                    store_id: store_id.to_string(),
                    version_id: version_id.to_string(),
                }
                .into());
            }
            SqliteRepo::delete_version_row(tx, version_id)?;
            Ok(())
        })
        .map_err(|e| e.with_store_id(store_id).with_version_id(version_id))?;

        tracing::debug!(store_id, version_id, "Version deleted");
        Ok(())
    }

    fn get_store(&self, store_id: &str) -> Result<Option<Store>> {
        let conn = self.conn()?;
        SqliteRepo::get_store(&conn, store_id)
    }

    fn get_version_history(&self, store_id: &str) -> Result<Vec<StoreVersion>> {
        let conn = self.conn()?;
        SqliteRepo::get_version_history(&conn, store_id)
    }

    fn get_version_for_store(
        &self,
        store_id: &str,
        version_id: &str,
    ) -> Result<Option<StoreVersion>> {
        let conn = self.conn()?;
        SqliteRepo::get_version_for_store(&conn, store_id, version_id)
    }

    fn get_current_version(&self, store_id: &str) -> Result<Option<StoreVersion>> {
        let conn = self.conn()?;
        SqliteRepo::get_current_version(&conn, store_id)
    }
}
