//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations for writable opens; verify schema for read-only opens.
//!
//! # Invariants
//! - Writable connections have migrations fully applied.
//! - Read-only connections run with `query_only=ON` and never migrate.
//! - An armed query deadline applies to the statements run after arming.

use super::migrations::{apply_migrations, current_user_version, latest_version};
use super::{DbError, DbResult, StoreOptions};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::os::raw::c_int;
use std::path::Path;
use std::time::{Duration, Instant};

/// Virtual machine steps between deadline checks.
const DEADLINE_CHECK_INTERVAL: c_int = 1000;

/// Opens a SQLite database file with default options and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_options(path, &StoreOptions::default())
}

/// Opens a SQLite database file and applies all pending migrations.
pub fn open_db_with_options(path: impl AsRef<Path>, options: &StoreOptions) -> DbResult<Connection> {
    let path = path.as_ref();
    open_logged(
        "file",
        || Connection::open(path),
        |conn| bootstrap_writable(conn, options),
    )
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let options = StoreOptions::default();
    open_logged("memory", Connection::open_in_memory, |conn| {
        bootstrap_writable(conn, &options)
    })
}

/// Opens an existing database file for the read path.
///
/// The file must already be migrated to the latest schema version.
///
/// # Errors
/// - `DbError::SchemaNotReady` when the schema is older than this binary.
/// - `DbError::UnsupportedSchemaVersion` when the schema is newer.
pub fn open_db_read_only(path: impl AsRef<Path>, options: &StoreOptions) -> DbResult<Connection> {
    let path = path.as_ref();
    open_logged(
        "read_only",
        || {
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        },
        |conn| bootstrap_read_only(conn, options),
    )
}

/// Interrupts any statement still running `timeout` after this call.
///
/// Interrupted statements fail with `SQLITE_INTERRUPT`, which
/// `DbError::is_unavailable` reports as unavailable. Re-arming replaces the
/// previous deadline.
pub fn arm_query_deadline(conn: &Connection, timeout: Duration) {
    let started_at = Instant::now();
    conn.progress_handler(
        DEADLINE_CHECK_INTERVAL,
        Some(move || started_at.elapsed() >= timeout),
    );
}

fn open_logged(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
    bootstrap: impl FnOnce(&mut Connection) -> DbResult<()>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_writable(conn: &mut Connection, options: &StoreOptions) -> DbResult<()> {
    conn.busy_timeout(options.busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}

fn bootstrap_read_only(conn: &mut Connection, options: &StoreOptions) -> DbResult<()> {
    conn.busy_timeout(options.busy_timeout)?;
    conn.execute_batch("PRAGMA query_only = ON;")?;

    let db_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if db_version > expected_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: expected_version,
        });
    }
    if db_version < expected_version {
        return Err(DbError::SchemaNotReady {
            db_version,
            expected_version,
        });
    }
    Ok(())
}
