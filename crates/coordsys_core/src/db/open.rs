//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file-backed core databases read-only.
//! - Open scratch in-memory databases for fixtures and tooling.
//! - Configure connection pragmas shared by both modes.
//!
//! # Invariants
//! - File connections are returned only after `verify_schema` passes.
//! - In-memory connections start empty; callers create the tables.

use super::schema::verify_schema;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens an existing core database file as a read-only session.
///
/// # Errors
/// - [`DbError::Sqlite`] when the file cannot be opened.
/// - [`DbError::MissingTable`] when `coord_system` or `meta` is absent.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let result = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(DbError::from)
    .and_then(|conn| {
        configure_connection(&conn)?;
        verify_schema(&conn)?;
        Ok(conn)
    });

    log_open_result("file", started_at, &result);
    result
}

/// Opens an empty in-memory database.
///
/// The schema is not verified here: the caller is expected to create and
/// seed `coord_system`/`meta` before building a repository over it.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|conn| {
            configure_connection(&conn)?;
            Ok(conn)
        });

    log_open_result("memory", started_at, &result);
    result
}

fn configure_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn log_open_result(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => {
            let error_code = match err {
                DbError::Sqlite(_) => "db_open_failed",
                DbError::MissingTable(_) => "db_schema_missing",
            };
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error_code={error_code} error={err}"
            );
        }
    }
}
