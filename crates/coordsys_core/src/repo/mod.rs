//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the read contract the service layer depends on.
//! - Isolate SQLite query details from lookup and caching logic.
//!
//! # Invariants
//! - Rows leave this layer validated (`CoordSystemRow::validate`).
//! - Empty results are not errors; they are logged as warnings.

pub mod coord_system_repo;
