//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the content store.
//! - Apply schema migrations in deterministic order.
//! - Provide read-only connections for the query path.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Read-only connections never migrate; they require the latest schema.
//! - Every connection carries a bounded busy timeout.
//! - A query deadline, once armed, interrupts statements that run past it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod migrations;
mod open;

pub use open::{
    arm_query_deadline, open_db, open_db_in_memory, open_db_read_only, open_db_with_options,
};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Read-only open found a schema that is not at the current version.
    SchemaNotReady {
        db_version: u32,
        expected_version: u32,
    },
}

impl DbError {
    /// Returns whether this error means the store could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
                    | rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::SystemIoFailure
                    | rusqlite::ErrorCode::OperationInterrupted
            ),
            _ => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady {
                db_version,
                expected_version,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected_version}; run migrations first"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Connection tuning shared by every open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Upper bound on how long one statement waits for a locked store.
    pub busy_timeout: Duration,
    /// Upper bound on how long one read statement may execute.
    pub query_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl StoreOptions {
    /// Sets the lock wait bound from milliseconds, as supplied by CLI/config.
    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout = Duration::from_millis(busy_timeout_ms);
        self
    }

    /// Sets the per-statement execution bound from milliseconds.
    pub fn with_query_timeout_ms(mut self, query_timeout_ms: u64) -> Self {
        self.query_timeout = Duration::from_millis(query_timeout_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{arm_query_deadline, DbError, StoreOptions};
    use rusqlite::Connection;
    use std::time::Duration;

    const COUNT_TO_100K: &str = "WITH RECURSIVE n(x) AS (
            SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 100000
        ) SELECT COUNT(*) FROM n;";

    #[test]
    fn default_options_use_five_second_timeouts() {
        let defaults = StoreOptions::default();
        assert_eq!(defaults.busy_timeout, Duration::from_secs(5));
        assert_eq!(defaults.query_timeout, Duration::from_secs(5));

        let tuned = StoreOptions::default()
            .with_busy_timeout_ms(250)
            .with_query_timeout_ms(40);
        assert_eq!(tuned.busy_timeout, Duration::from_millis(250));
        assert_eq!(tuned.query_timeout, Duration::from_millis(40));
    }

    #[test]
    fn busy_failures_are_classified_as_unavailable() {
        let busy = DbError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_unavailable());

        let version = DbError::SchemaNotReady {
            db_version: 0,
            expected_version: 1,
        };
        assert!(!version.is_unavailable());
    }

    #[test]
    fn expired_deadline_interrupts_running_statement() {
        let conn = Connection::open_in_memory().unwrap();
        arm_query_deadline(&conn, Duration::ZERO);

        let err = conn
            .query_row(COUNT_TO_100K, [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(DbError::from(err).is_unavailable());
    }

    #[test]
    fn generous_deadline_lets_statement_finish() {
        let conn = Connection::open_in_memory().unwrap();
        arm_query_deadline(&conn, Duration::from_secs(60));

        let count: i64 = conn
            .query_row(COUNT_TO_100K, [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 100_000);
    }
}
