//! Version lifecycle manager
//!
//! Stateless domain service over a `StoreBackend`. It validates inputs,
//! stamps creation times and checks existence before destructive calls;
//! atomicity and isolation belong to the backend. `requester_login` is
//! recorded as provenance only.

use chrono::Utc;
use std::time::Instant;
use storekeep_core::errors::{DomainError, Result};
use storekeep_core::model::{
    NewStore, NewStoreVersion, Store, StoreFields, StoreVersion, VersionFields,
};
use storekeep_core::{log_op_end, log_op_error, log_op_start, StoreBackend};

/// Domain service enforcing version invariants on top of a backend
pub struct StoreService<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> StoreService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create a store together with its first version
    ///
    /// Returns the new store id.
    pub fn create_store(&self, fields: StoreFields, requester_login: &str) -> Result<String> {
        let started = Instant::now();
        log_op_start!("create_store", requester = requester_login);

        let result = fields.validate().and_then(|()| {
            let new_store = NewStore::new(fields, requester_login, Utc::now());
            self.backend.create_store(&new_store)
        });

        finish("create_store", started, result)
    }

    /// Append a version that becomes the current one
    pub fn create_store_version(
        &self,
        fields: VersionFields,
        store_id: &str,
        requester_login: &str,
    ) -> Result<StoreVersion> {
        let started = Instant::now();
        log_op_start!(
            "create_store_version",
            store_id = store_id,
            requester = requester_login
        );

        let result = fields.validate().and_then(|()| {
            let new_version = NewStoreVersion::new(fields, requester_login, Utc::now());
            self.backend.append_version(store_id, &new_version)
        });

        finish("create_store_version", started, result)
    }

    /// Delete a store and all of its versions
    pub fn delete_store(&self, store_id: &str, requester_login: &str) -> Result<()> {
        let started = Instant::now();
        log_op_start!(
            "delete_store",
            store_id = store_id,
            requester = requester_login
        );

        let result = self.backend.get_store(store_id).and_then(|store| {
            if store.is_none() {
                return Err(DomainError::StoreNotFound {
                    store_id: store_id.to_string(),
                }
                .into());
            }
            self.backend.delete_store(store_id)
        });

        finish("delete_store", started, result)
    }

    /// Delete one non-current version of a store
    pub fn delete_store_version(
        &self,
        store_id: &str,
        version_id: &str,
        requester_login: &str,
    ) -> Result<()> {
        let started = Instant::now();
        log_op_start!(
            "delete_store_version",
            store_id = store_id,
            version_id = version_id,
            requester = requester_login
        );

        let result = self
            .backend
            .get_version_for_store(store_id, version_id)
            .and_then(|version| {
                if version.is_none() {
                    return Err(DomainError::VersionNotFound {
                        store_id: store_id.to_string(),
                        version_id: version_id.to_string(),
                    }
                    .into());
                }
                self.backend.delete_version(store_id, version_id)
            });

        finish("delete_store_version", started, result)
    }

    pub fn get_store(&self, store_id: &str, requester_login: &str) -> Result<Option<Store>> {
        let started = Instant::now();
        log_op_start!("get_store", store_id = store_id, requester = requester_login);

        finish("get_store", started, self.backend.get_store(store_id))
    }

    /// Version history, newest first; empty when the store has none
    pub fn get_store_history(
        &self,
        store_id: &str,
        requester_login: &str,
    ) -> Result<Vec<StoreVersion>> {
        let started = Instant::now();
        log_op_start!(
            "get_store_history",
            store_id = store_id,
            requester = requester_login
        );

        finish(
            "get_store_history",
            started,
            self.backend.get_version_history(store_id),
        )
    }

    /// A version of `store_id`; another store's version id yields `None`
    pub fn get_store_version(
        &self,
        store_id: &str,
        version_id: &str,
        requester_login: &str,
    ) -> Result<Option<StoreVersion>> {
        let started = Instant::now();
        log_op_start!(
            "get_store_version",
            store_id = store_id,
            version_id = version_id,
            requester = requester_login
        );

        finish(
            "get_store_version",
            started,
            self.backend.get_version_for_store(store_id, version_id),
        )
    }

    pub fn get_current_version(&self, store_id: &str) -> Result<Option<StoreVersion>> {
        let started = Instant::now();
        log_op_start!("get_current_version", store_id = store_id);

        finish(
            "get_current_version",
            started,
            self.backend.get_current_version(store_id),
        )
    }
}

/// Close the operation boundary opened by `log_op_start!`
fn finish<T>(op: &'static str, started: Instant, result: Result<T>) -> Result<T> {
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms);
        }
        Err(err) => {
            log_op_error!(op, err.clone(), duration_ms = duration_ms);
        }
    }
    result
}
