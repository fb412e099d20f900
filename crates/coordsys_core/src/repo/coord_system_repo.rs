//! Coordinate-system repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate a species id into its `coord_system` rows ordered by rank.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Only `SELECT` statements are issued.
//! - Read paths skip invalid persisted rows and log a warning for each.
//! - Write paths report `Unsupported`; they never silently succeed.

use crate::db::{verify_schema, DbError};
use crate::model::coord_system::{CoordSystemId, CoordSystemRow, SpeciesId};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SPECIES_NAME_META_KEY: &str = "species.production_name";

const COORD_SYSTEM_SELECT_SQL: &str = "SELECT
    cs.coord_system_id AS coord_system_id,
    cs.species_id AS species_id,
    cs.name AS name,
    cs.version AS version,
    cs.rank AS rank,
    cs.attrib AS attrib
FROM coord_system cs
JOIN meta m ON m.species_id = cs.species_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for coordinate-system reads.
#[derive(Debug)]
pub enum RepoError {
    /// The session cannot serve coordinate-system queries.
    Configuration(String),
    Db(DbError),
    /// A write operation was requested.
    Unsupported(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "repository configuration error: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Unsupported(operation) => {
                write!(f, "coord_system {operation} is not implemented")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read access to the `coord_system` table.
pub trait CoordSystemRepository {
    /// Rows of one species in ascending rank order. Empty when none exist.
    /// Rows failing `CoordSystemRow::validate` are left out.
    fn fetch_all(&self, species_id: SpeciesId) -> RepoResult<Vec<CoordSystemRow>>;
    fn fetch_by_id(&self, coord_system_id: CoordSystemId) -> RepoResult<Option<CoordSystemRow>>;
    /// Always `Err(RepoError::Unsupported("insert"))`.
    fn insert(&self, rows: &[CoordSystemRow]) -> RepoResult<()>;
    /// Always `Err(RepoError::Unsupported("delete"))`.
    fn delete(&self, rows: &[CoordSystemRow]) -> RepoResult<()>;
}

/// SQLite-backed coordinate-system repository borrowing a caller-owned session.
pub struct SqliteCoordSystemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCoordSystemRepository<'conn> {
    /// Binds the repository to a session after checking its schema.
    ///
    /// # Errors
    /// - [`RepoError::Configuration`] when `coord_system` or `meta` is missing.
    /// - [`RepoError::Db`] when the schema check itself fails.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        match verify_schema(conn) {
            Ok(()) => Ok(Self { conn }),
            Err(DbError::MissingTable(table)) => Err(RepoError::Configuration(format!(
                "session has no `{table}` table; open a core database first"
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

impl CoordSystemRepository for SqliteCoordSystemRepository<'_> {
    fn fetch_all(&self, species_id: SpeciesId) -> RepoResult<Vec<CoordSystemRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COORD_SYSTEM_SELECT_SQL}
             WHERE m.meta_key = ?1
               AND cs.species_id = ?2
             ORDER BY cs.rank ASC;"
        ))?;

        let mut rows = stmt.query(params![SPECIES_NAME_META_KEY, species_id])?;
        let mut coord_systems = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(parsed) = valid_row(parse_coord_system_row(row)?) {
                coord_systems.push(parsed);
            }
        }

        if coord_systems.is_empty() {
            warn!(
                "event=coord_system_fetch module=repo status=empty species_id={species_id} message=\"could not find any coordinate system\""
            );
        } else {
            debug!(
                "event=coord_system_fetch module=repo status=ok species_id={species_id} rows={}",
                coord_systems.len()
            );
        }

        Ok(coord_systems)
    }

    fn fetch_by_id(&self, coord_system_id: CoordSystemId) -> RepoResult<Option<CoordSystemRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COORD_SYSTEM_SELECT_SQL}
             WHERE m.meta_key = ?1
               AND cs.coord_system_id = ?2;"
        ))?;

        let row = stmt
            .query_row(
                params![SPECIES_NAME_META_KEY, coord_system_id],
                parse_coord_system_row,
            )
            .optional()?;

        Ok(row.and_then(valid_row))
    }

    fn insert(&self, rows: &[CoordSystemRow]) -> RepoResult<()> {
        warn!(
            "event=coord_system_insert module=repo status=unsupported rows={}",
            rows.len()
        );
        Err(RepoError::Unsupported("insert"))
    }

    fn delete(&self, rows: &[CoordSystemRow]) -> RepoResult<()> {
        warn!(
            "event=coord_system_delete module=repo status=unsupported rows={}",
            rows.len()
        );
        Err(RepoError::Unsupported("delete"))
    }
}

fn valid_row(row: CoordSystemRow) -> Option<CoordSystemRow> {
    match row.validate() {
        Ok(()) => Some(row),
        Err(err) => {
            warn!(
                "event=coord_system_fetch module=repo status=skipped_row species_id={} coord_system_id={} message=\"{err}\"",
                row.species_id, row.coord_system_id
            );
            None
        }
    }
}

fn parse_coord_system_row(row: &Row<'_>) -> Result<CoordSystemRow, rusqlite::Error> {
    Ok(CoordSystemRow {
        coord_system_id: row.get("coord_system_id")?,
        species_id: row.get("species_id")?,
        name: row.get("name")?,
        version: row.get("version")?,
        rank: row.get("rank")?,
        attrib: row.get("attrib")?,
    })
}
