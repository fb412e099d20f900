//! Read-only access to the coordinate systems of a genome-annotation core
//! database: rank-ordered scans, a bounded per-instance cache, and lookups by
//! alias, name/version, rank or id.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, flush_logging, init_logging, init_stderr_logging, logging_status,
    LoggingError,
};
pub use model::coord_system::{
    AttribTags, CoordSystemId, CoordSystemRow, CoordinateSystem, SpeciesId, DEFAULT_SPECIES_ID,
};
pub use repo::coord_system_repo::{
    CoordSystemRepository, RepoError, RepoResult, SqliteCoordSystemRepository,
};
pub use service::coord_system_service::{
    CoordSystemService, ServiceConfig, ServiceError, ServiceResult, SEQUENCE_LEVEL_ALIAS,
    TOP_LEVEL_ALIAS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
