//! Presence checks for the tables this crate reads.

use super::{DbError, DbResult};
use rusqlite::Connection;

/// Tables queried by the coordinate-system repository.
pub const REQUIRED_TABLES: &[&str] = &["coord_system", "meta"];

/// Fails with [`DbError::MissingTable`] for the first required table that
/// does not exist.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
