//! SQLite repository implementation
//!
//! Row-level statements over `stores` and `store_versions`. Every function
//! takes a `&Connection`, so it runs equally inside a `Transaction` (which
//! derefs to `Connection`) or on a bare pooled connection for reads.
//! Transaction boundaries are owned by `SqliteBackend`.

use crate::errors::{sqlite_op, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use storekeep_core::model::{NewStore, NewStoreVersion, Store, StoreVersion};

const STORE_COLUMNS: &str =
    "id, name, address, creator_login, owner_name, opening_time, closing_time, created_at";

const VERSION_COLUMNS: &str = "id, store_id, version_number, creator_login, owner_name, \
     opening_time, closing_time, created_at, is_current";

/// SQLite repository for stores and their versions
pub struct SqliteRepo;

impl SqliteRepo {
    /// Insert a store row
    pub fn insert_store(conn: &Connection, store_id: &str, new_store: &NewStore) -> Result<()> {
        let fields = &new_store.fields;
        conn.execute(
            "INSERT INTO stores (id, name, address, creator_login, owner_name, opening_time, closing_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                store_id,
                fields.name,
                fields.address,
                new_store.creator_login,
                fields.owner_name,
                fields.opening_time,
                fields.closing_time,
                new_store.created_at.timestamp_millis(),
            ],
        )
        .map_err(sqlite_op("insert_store"))?;

        Ok(())
    }

    /// Insert a version row and return it as persisted
    pub fn insert_version(
        conn: &Connection,
        version_id: &str,
        store_id: &str,
        version_number: u32,
        new_version: &NewStoreVersion,
        is_current: bool,
    ) -> Result<StoreVersion> {
        let fields = &new_version.fields;
        conn.execute(
            "INSERT INTO store_versions (id, store_id, version_number, creator_login, owner_name, opening_time, closing_time, created_at, is_current)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                version_id,
                store_id,
                version_number,
                new_version.creator_login,
                fields.owner_name,
                fields.opening_time,
                fields.closing_time,
                new_version.created_at.timestamp_millis(),
                is_current,
            ],
        )
        .map_err(sqlite_op("insert_version"))?;

        Ok(StoreVersion {
            id: version_id.to_string(),
            store_id: store_id.to_string(),
            version_number,
            creator_login: new_version.creator_login.clone(),
            owner_name: fields.owner_name.clone(),
            opening_time: fields.opening_time.clone(),
            closing_time: fields.closing_time.clone(),
            created_at: truncate_to_millis(new_version.created_at),
            is_current,
        })
    }

    /// Get a store by ID
    pub fn get_store(conn: &Connection, store_id: &str) -> Result<Option<Store>> {
        let sql = format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLUMNS);
        conn.query_row(&sql, [store_id], row_to_store)
            .optional()
            .map_err(sqlite_op("get_store"))
    }

    /// Get the version flagged current for a store
    pub fn get_current_version(conn: &Connection, store_id: &str) -> Result<Option<StoreVersion>> {
        let sql = format!(
            "SELECT {} FROM store_versions WHERE store_id = ?1 AND is_current = 1",
            VERSION_COLUMNS
        );
        conn.query_row(&sql, [store_id], row_to_version)
            .optional()
            .map_err(sqlite_op("get_current_version"))
    }

    /// Get a version only if it belongs to `store_id`
    pub fn get_version_for_store(
        conn: &Connection,
        store_id: &str,
        version_id: &str,
    ) -> Result<Option<StoreVersion>> {
        let sql = format!(
            "SELECT {} FROM store_versions WHERE id = ?1 AND store_id = ?2",
            VERSION_COLUMNS
        );
        conn.query_row(&sql, [version_id, store_id], row_to_version)
            .optional()
            .map_err(sqlite_op("get_version_for_store"))
    }

    /// All versions of a store, newest first
    ///
    /// Versions stamped within the same millisecond are ordered by number.
    pub fn get_version_history(conn: &Connection, store_id: &str) -> Result<Vec<StoreVersion>> {
        let sql = format!(
            "SELECT {} FROM store_versions WHERE store_id = ?1
             ORDER BY created_at DESC, version_number DESC",
            VERSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(sqlite_op("get_version_history"))?;
        let versions = stmt
            .query_map([store_id], row_to_version)
            .map_err(sqlite_op("get_version_history"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sqlite_op("get_version_history"))?;
        Ok(versions)
    }

    /// Clear the current flag on one version; returns rows changed
    pub fn demote_version(conn: &Connection, version_id: &str) -> Result<usize> {
        conn.execute(
            "UPDATE store_versions SET is_current = 0 WHERE id = ?1 AND is_current = 1",
            [version_id],
        )
        .map_err(sqlite_op("demote_version"))
    }

    /// Delete every version of a store; returns rows deleted
    pub fn delete_versions_of_store(conn: &Connection, store_id: &str) -> Result<usize> {
        conn.execute("DELETE FROM store_versions WHERE store_id = ?1", [store_id])
            .map_err(sqlite_op("delete_versions_of_store"))
    }

    /// Delete the store row; returns rows deleted
    pub fn delete_store_row(conn: &Connection, store_id: &str) -> Result<usize> {
        conn.execute("DELETE FROM stores WHERE id = ?1", [store_id])
            .map_err(sqlite_op("delete_store_row"))
    }

    /// Delete one version row; returns rows deleted
    pub fn delete_version_row(conn: &Connection, version_id: &str) -> Result<usize> {
        conn.execute("DELETE FROM store_versions WHERE id = ?1", [version_id])
            .map_err(sqlite_op("delete_version_row"))
    }
}

fn row_to_store(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        creator_login: row.get(3)?,
        owner_name: row.get(4)?,
        opening_time: row.get(5)?,
        closing_time: row.get(6)?,
        created_at: millis_column(row, 7)?,
    })
}

fn row_to_version(row: &Row<'_>) -> rusqlite::Result<StoreVersion> {
    Ok(StoreVersion {
        id: row.get(0)?,
        store_id: row.get(1)?,
        version_number: row.get(2)?,
        creator_login: row.get(3)?,
        owner_name: row.get(4)?,
        opening_time: row.get(5)?,
        closing_time: row.get(6)?,
        created_at: millis_column(row, 7)?,
        is_current: row.get(8)?,
    })
}

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", millis).into(),
        )
    })
}

/// Drop sub-millisecond precision so returned values equal what a read
/// would produce
fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use storekeep_core::model::{StoreFields, VersionFields};

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    fn new_store() -> NewStore {
        NewStore::new(
            StoreFields {
                name: "Acme".to_string(),
                address: "1 Main St".to_string(),
                owner_name: "Jo".to_string(),
                opening_time: "08:00".to_string(),
                closing_time: "20:00".to_string(),
            },
            "creator",
            Utc::now(),
        )
    }

    fn new_version(owner: &str) -> NewStoreVersion {
        NewStoreVersion::new(
            VersionFields {
                owner_name: owner.to_string(),
                opening_time: "09:00".to_string(),
                closing_time: "21:00".to_string(),
            },
            "editor",
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_and_read_store() {
        let conn = setup();
        let store = new_store();
        SqliteRepo::insert_store(&conn, "s1", &store).unwrap();

        let loaded = SqliteRepo::get_store(&conn, "s1").unwrap().unwrap();
        assert_eq!(loaded.name, "Acme");
        assert_eq!(loaded.creator_login, "creator");
        assert_eq!(loaded.created_at, truncate_to_millis(store.created_at));
        assert!(SqliteRepo::get_store(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_inserted_version_matches_read_back() {
        let conn = setup();
        SqliteRepo::insert_store(&conn, "s1", &new_store()).unwrap();
        let inserted =
            SqliteRepo::insert_version(&conn, "v1", "s1", 1, &new_version("Jo"), true).unwrap();

        let loaded = SqliteRepo::get_current_version(&conn, "s1").unwrap().unwrap();
        assert_eq!(inserted, loaded);
    }

    #[test]
    fn test_second_current_version_rejected_by_index() {
        let conn = setup();
        SqliteRepo::insert_store(&conn, "s1", &new_store()).unwrap();
        SqliteRepo::insert_version(&conn, "v1", "s1", 1, &new_version("Jo"), true).unwrap();

        let result = SqliteRepo::insert_version(&conn, "v2", "s1", 2, &new_version("Al"), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_version_for_wrong_store_is_absent() {
        let conn = setup();
        SqliteRepo::insert_store(&conn, "s1", &new_store()).unwrap();
        SqliteRepo::insert_store(&conn, "s2", &new_store()).unwrap();
        SqliteRepo::insert_version(&conn, "v1", "s1", 1, &new_version("Jo"), true).unwrap();

        assert!(SqliteRepo::get_version_for_store(&conn, "s2", "v1")
            .unwrap()
            .is_none());
        assert!(SqliteRepo::get_version_for_store(&conn, "s1", "v1")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_version_without_store_violates_foreign_key() {
        let conn = setup();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        let result = SqliteRepo::insert_version(&conn, "v1", "ghost", 1, &new_version("Jo"), true);
        assert!(result.is_err());
    }
}
