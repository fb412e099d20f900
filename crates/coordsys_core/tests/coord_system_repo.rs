mod common;

use common::{add_coord_system, create_core_schema, multi_species_db, HUMAN, MOUSE, ORPHAN};
use coordsys_core::db::open_db_in_memory;
use coordsys_core::{
    CoordSystemRepository, CoordSystemRow, RepoError, SqliteCoordSystemRepository,
    DEFAULT_SPECIES_ID,
};

#[test]
fn fetch_all_returns_species_rows_in_rank_order() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    let rows = repo.fetch_all(HUMAN).unwrap();
    let ranks: Vec<i64> = rows.iter().map(|row| row.rank).collect();
    let ids: Vec<i64> = rows.iter().map(|row| row.coord_system_id).collect();

    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    assert_eq!(ids, vec![11, 12, 13, 14, 15]);
    assert!(rows.iter().all(|row| row.species_id == HUMAN));
}

#[test]
fn fetch_all_keeps_species_apart() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    let rows = repo.fetch_all(MOUSE).unwrap();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["chromosome", "contig"]);
}

#[test]
fn fetch_all_is_empty_for_unknown_species_or_missing_meta() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    assert!(repo.fetch_all(99).unwrap().is_empty());
    assert!(repo.fetch_all(ORPHAN).unwrap().is_empty());
}

#[test]
fn fetch_all_preserves_null_version_and_attrib() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    let rows = repo.fetch_all(DEFAULT_SPECIES_ID).unwrap();
    let clone = rows.iter().find(|row| row.name == "clone").unwrap();
    assert_eq!(
        clone,
        &CoordSystemRow {
            coord_system_id: 15,
            species_id: HUMAN,
            name: "clone".to_string(),
            version: None,
            rank: 5,
            attrib: None,
        }
    );
}

#[test]
fn fetch_by_id_returns_row_or_none() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    let row = repo.fetch_by_id(22).unwrap().unwrap();
    assert_eq!(row.species_id, MOUSE);
    assert_eq!(row.name, "contig");
    assert_eq!(row.attrib.as_deref(), Some("sequence_level"));

    assert!(repo.fetch_by_id(999).unwrap().is_none());
}

#[test]
fn invalid_persisted_rows_are_skipped() {
    let conn = multi_species_db();
    add_coord_system(&conn, 16, HUMAN, "toplevel", None, 0, None);
    add_coord_system(&conn, 17, HUMAN, " ", None, 7, None);
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();

    let ids: Vec<i64> = repo
        .fetch_all(HUMAN)
        .unwrap()
        .iter()
        .map(|row| row.coord_system_id)
        .collect();
    assert_eq!(ids, vec![11, 12, 13, 14, 15]);

    assert!(repo.fetch_by_id(16).unwrap().is_none());
    assert!(repo.fetch_by_id(17).unwrap().is_none());
}

#[test]
fn write_operations_are_unsupported() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();
    let rows = repo.fetch_all(HUMAN).unwrap();

    assert!(matches!(repo.insert(&rows), Err(RepoError::Unsupported("insert"))));
    assert!(matches!(repo.delete(&rows), Err(RepoError::Unsupported("delete"))));
    assert_eq!(repo.fetch_all(HUMAN).unwrap().len(), rows.len());
}

#[test]
fn try_new_rejects_session_without_core_tables() {
    let conn = open_db_in_memory().unwrap();

    let err = SqliteCoordSystemRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::Configuration(message) if message.contains("coord_system")));

    create_core_schema(&conn);
    assert!(SqliteCoordSystemRepository::try_new(&conn).is_ok());
}

#[test]
fn storage_errors_propagate_unchanged() {
    let conn = multi_species_db();
    let repo = SqliteCoordSystemRepository::try_new(&conn).unwrap();
    conn.execute_batch("DROP TABLE coord_system;").unwrap();

    let err = repo.fetch_all(HUMAN).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}
