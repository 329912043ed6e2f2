//! Error handling for storekeep-store
//!
//! Wraps the core `ExError` facility with store-specific helpers

use rusqlite::ErrorCode;
use storekeep_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Whether a driver error means another writer holds the database lock
pub fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Create a database error from rusqlite::Error
///
/// Lock contention surfaces as `Conflict` (the transaction could not be
/// serialized); every other driver failure is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = if is_lock_contention(&err) {
        ExErrorKind::Conflict
    } else {
        ExErrorKind::Persistence
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Same as `from_rusqlite` with the failing operation recorded
pub fn sqlite_op(op: &'static str) -> impl Fn(rusqlite::Error) -> ExError {
    move |err| {
        let ex = from_rusqlite(err);
        let message = ex.message().to_string();
        ExError::new(ex.kind()).with_op(op).with_message(message)
    }
}

/// Create an error for a connection that could not be checked out of the pool
pub fn from_pool(err: r2d2::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("connection_pool")
        .with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_maps_to_conflict() {
        let err = from_rusqlite(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        assert_eq!(err.kind(), ExErrorKind::Conflict);
    }

    #[test]
    fn test_locked_maps_to_conflict() {
        let err = from_rusqlite(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED));
        assert_eq!(err.kind(), ExErrorKind::Conflict);
    }

    #[test]
    fn test_other_failures_map_to_persistence() {
        let err = from_rusqlite(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT));
        assert_eq!(err.kind(), ExErrorKind::Persistence);

        let err = from_rusqlite(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }

    #[test]
    fn test_sqlite_op_records_operation() {
        let err = sqlite_op("append_version")(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        assert_eq!(err.op(), Some("append_version"));
        assert_eq!(err.kind(), ExErrorKind::Conflict);
    }
}
