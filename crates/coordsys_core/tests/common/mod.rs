#![allow(dead_code)]

use coordsys_core::db::DbError;
use coordsys_core::{
    CoordSystemId, CoordSystemRepository, CoordSystemRow, RepoError, RepoResult, SpeciesId,
    SqliteCoordSystemRepository,
};
use rusqlite::{params, Connection};
use std::cell::Cell;

pub const HUMAN: SpeciesId = 1;
pub const MOUSE: SpeciesId = 2;
pub const ZEBRAFISH: SpeciesId = 3;
/// Has `coord_system` rows but no `species.production_name` meta entry.
pub const ORPHAN: SpeciesId = 4;

const CORE_SCHEMA_SQL: &str = "
CREATE TABLE meta (
    meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
    species_id INTEGER DEFAULT 1,
    meta_key VARCHAR(40) NOT NULL,
    meta_value VARCHAR(255) NOT NULL,
    UNIQUE (species_id, meta_key, meta_value)
);

CREATE TABLE coord_system (
    coord_system_id INTEGER PRIMARY KEY AUTOINCREMENT,
    species_id INTEGER NOT NULL DEFAULT 1,
    name VARCHAR(40) NOT NULL,
    version VARCHAR(255) DEFAULT NULL,
    rank INTEGER NOT NULL,
    attrib VARCHAR(255) DEFAULT NULL,
    UNIQUE (rank, species_id),
    UNIQUE (name, version, species_id)
);
";

pub fn create_core_schema(conn: &Connection) {
    conn.execute_batch(CORE_SCHEMA_SQL).unwrap();
}

pub fn add_species(conn: &Connection, species_id: SpeciesId, production_name: &str) {
    conn.execute(
        "INSERT INTO meta (species_id, meta_key, meta_value) VALUES (?1, 'species.production_name', ?2);",
        params![species_id, production_name],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO meta (species_id, meta_key, meta_value) VALUES (?1, 'species.division', 'EnsemblVertebrates');",
        params![species_id],
    )
    .unwrap();
}

pub fn add_coord_system(
    conn: &Connection,
    coord_system_id: CoordSystemId,
    species_id: SpeciesId,
    name: &str,
    version: Option<&str>,
    rank: i64,
    attrib: Option<&str>,
) {
    conn.execute(
        "INSERT INTO coord_system (coord_system_id, species_id, name, version, rank, attrib)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![coord_system_id, species_id, name, version, rank, attrib],
    )
    .unwrap();
}

/// Two-row single-species database:
/// `chromosome:GRCh38` (rank 1, default) and `contig` (rank 2, sequence level).
pub fn minimal_db() -> Connection {
    let conn = coordsys_core::db::open_db_in_memory().unwrap();
    create_core_schema(&conn);
    add_species(&conn, HUMAN, "homo_sapiens");
    add_coord_system(&conn, 1, HUMAN, "chromosome", Some("GRCh38"), 1, Some("default"));
    add_coord_system(&conn, 2, HUMAN, "contig", None, 2, Some("sequence_level"));
    conn
}

/// Multi-species database. Rows are inserted out of rank order on purpose.
pub fn multi_species_db() -> Connection {
    let conn = coordsys_core::db::open_db_in_memory().unwrap();
    create_core_schema(&conn);
    add_species(&conn, HUMAN, "homo_sapiens");
    add_species(&conn, MOUSE, "mus_musculus");
    add_species(&conn, ZEBRAFISH, "danio_rerio");

    add_coord_system(&conn, 14, HUMAN, "contig", None, 4, Some("default_version,sequence_level"));
    add_coord_system(&conn, 11, HUMAN, "chromosome", Some("GRCh38"), 1, Some("default_version"));
    add_coord_system(&conn, 13, HUMAN, "chromosome", Some("GRCh37"), 3, None);
    add_coord_system(&conn, 12, HUMAN, "scaffold", Some("GRCh38"), 2, Some("default_version"));
    add_coord_system(&conn, 15, HUMAN, "clone", None, 5, None);

    add_coord_system(&conn, 21, MOUSE, "chromosome", Some("GRCm39"), 1, Some("default_version"));
    add_coord_system(&conn, 22, MOUSE, "contig", None, 2, Some("sequence_level"));

    add_coord_system(&conn, 31, ZEBRAFISH, "chromosome", Some("GRCz11"), 1, Some("default_version"));
    add_coord_system(&conn, 32, ZEBRAFISH, "contig", None, 2, Some("sequence_level"));

    add_coord_system(&conn, 41, ORPHAN, "chromosome", Some("X1"), 1, Some("default_version"));
    conn
}

/// Repository wrapper counting storage round trips. Scans of the species set
/// with `fail_species` report a storage error.
pub struct CountingRepository<'conn> {
    inner: SqliteCoordSystemRepository<'conn>,
    fetch_all_calls: Cell<usize>,
    fetch_by_id_calls: Cell<usize>,
    failing_species: Cell<Option<SpeciesId>>,
}

impl<'conn> CountingRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteCoordSystemRepository::try_new(conn).unwrap(),
            fetch_all_calls: Cell::new(0),
            fetch_by_id_calls: Cell::new(0),
            failing_species: Cell::new(None),
        }
    }

    pub fn fail_species(&self, species_id: SpeciesId) {
        self.failing_species.set(Some(species_id));
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.get()
    }

    pub fn fetch_by_id_calls(&self) -> usize {
        self.fetch_by_id_calls.get()
    }
}

impl CoordSystemRepository for CountingRepository<'_> {
    fn fetch_all(&self, species_id: SpeciesId) -> RepoResult<Vec<CoordSystemRow>> {
        self.fetch_all_calls.set(self.fetch_all_calls.get() + 1);
        if self.failing_species.get() == Some(species_id) {
            return Err(RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)));
        }
        self.inner.fetch_all(species_id)
    }

    fn fetch_by_id(&self, coord_system_id: CoordSystemId) -> RepoResult<Option<CoordSystemRow>> {
        self.fetch_by_id_calls.set(self.fetch_by_id_calls.get() + 1);
        self.inner.fetch_by_id(coord_system_id)
    }

    fn insert(&self, rows: &[CoordSystemRow]) -> RepoResult<()> {
        self.inner.insert(rows)
    }

    fn delete(&self, rows: &[CoordSystemRow]) -> RepoResult<()> {
        self.inner.delete(rows)
    }
}
