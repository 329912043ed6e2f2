//! Storage backend contract
//!
//! The version lifecycle service talks to persistence only through this
//! trait. Implementations own atomicity and isolation: every mutating method
//! is one transaction that either commits fully or leaves no trace.

use crate::errors::Result;
use crate::model::{NewStore, NewStoreVersion, Store, StoreVersion};

/// Transactional persistence over the `stores` and `store_versions` tables
///
/// Read methods report a missing row as `Ok(None)` or an empty vector, never
/// as an error.
pub trait StoreBackend: Send + Sync {
    /// Insert a store and its version 1 (current) atomically.
    ///
    /// Returns the generated store id.
    fn create_store(&self, new_store: &NewStore) -> Result<String>;

    /// Append a version: demote the current version and insert
    /// `previous + 1` as current, atomically.
    ///
    /// The stored `created_at` is never earlier than the replaced version's,
    /// so history order by time agrees with version numbers.
    ///
    /// Fails with `NotFound` when the store has no current version and with
    /// `Conflict` when the write could not be serialized.
    fn append_version(&self, store_id: &str, new_version: &NewStoreVersion)
        -> Result<StoreVersion>;

    /// Delete every version of the store, then the store row, atomically.
    ///
    /// Fails with `NotFound` when no store row was deleted.
    fn delete_store(&self, store_id: &str) -> Result<()>;

    /// Delete a single non-current version belonging to `store_id`.
    ///
    /// Fails with `NotFound` when the version does not belong to the store and
    /// with `InvalidOperation` when it is the current version.
    fn delete_version(&self, store_id: &str, version_id: &str) -> Result<()>;

    fn get_store(&self, store_id: &str) -> Result<Option<Store>>;

    /// Versions of a store, newest first.
    fn get_version_history(&self, store_id: &str) -> Result<Vec<StoreVersion>>;

    /// Look up a version scoped to its store.
    fn get_version_for_store(&self, store_id: &str, version_id: &str)
        -> Result<Option<StoreVersion>>;

    fn get_current_version(&self, store_id: &str) -> Result<Option<StoreVersion>>;
}

impl<B: StoreBackend + ?Sized> StoreBackend for std::sync::Arc<B> {
    fn create_store(&self, new_store: &NewStore) -> Result<String> {
        (**self).create_store(new_store)
    }

    fn append_version(
        &self,
        store_id: &str,
        new_version: &NewStoreVersion,
    ) -> Result<StoreVersion> {
        (**self).append_version(store_id, new_version)
    }

    fn delete_store(&self, store_id: &str) -> Result<()> {
        (**self).delete_store(store_id)
    }

    fn delete_version(&self, store_id: &str, version_id: &str) -> Result<()> {
        (**self).delete_version(store_id, version_id)
    }

    fn get_store(&self, store_id: &str) -> Result<Option<Store>> {
        (**self).get_store(store_id)
    }

    fn get_version_history(&self, store_id: &str) -> Result<Vec<StoreVersion>> {
        (**self).get_version_history(store_id)
    }

    fn get_version_for_store(
        &self,
        store_id: &str,
        version_id: &str,
    ) -> Result<Option<StoreVersion>> {
        (**self).get_version_for_store(store_id, version_id)
    }

    fn get_current_version(&self, store_id: &str) -> Result<Option<StoreVersion>> {
        (**self).get_current_version(store_id)
    }
}
