//! Coordinate-system domain model.
//!
//! # Responsibility
//! - Define the row and record shapes shared by repository and service.
//!
//! # Invariants
//! - Records are derived from rows and never mutated afterwards.

pub mod coord_system;
