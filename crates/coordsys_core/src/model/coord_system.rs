//! Coordinate-system domain model.
//!
//! # Responsibility
//! - Define the raw storage row and the derived, immutable record.
//! - Parse attribute text into markers and tags.
//!
//! # Invariants
//! - `CoordinateSystem::version` is never null; unversioned systems use `""`.
//! - Persisted ranks start at 1; rank 0 is reserved for the `toplevel` alias.
//! - Flag derivation uses substring containment over the raw attribute text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key of a `coord_system` row.
pub type CoordSystemId = i64;

/// Species identifier shared by `coord_system` and `meta`.
pub type SpeciesId = i64;

/// Species used by single-species databases and callers.
pub const DEFAULT_SPECIES_ID: SpeciesId = 1;

/// Attribute marker for the system sequence is stored at.
pub const SEQUENCE_LEVEL_MARKER: &str = "sequence_level";
/// Attribute marker for the default version of a named system.
pub const DEFAULT_MARKER: &str = "default";
/// Attribute marker for the default assembly version.
pub const DEFAULT_VERSION_MARKER: &str = "default_version";
/// Stored name that marks a record as top level on single-record lookups.
pub const TOP_LEVEL_SENTINEL: &str = "top_level";

static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("valid tag separator regex"));

/// Validation failure for rows read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValidationError {
    EmptyName(CoordSystemId),
    InvalidRank { coord_system_id: CoordSystemId, rank: i64 },
}

impl Display for RowValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(id) => write!(f, "coord_system {id} has an empty name"),
            Self::InvalidRank {
                coord_system_id,
                rank,
            } => write!(
                f,
                "coord_system {coord_system_id} has rank {rank}; persisted ranks start at 1"
            ),
        }
    }
}

impl Error for RowValidationError {}

/// Attribute text of a coordinate system, kept verbatim plus a parsed tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttribTags {
    raw: Option<String>,
    tags: BTreeSet<String>,
}

impl AttribTags {
    /// Parses attribute text. Tags are separated by commas and/or whitespace.
    pub fn parse(raw: Option<&str>) -> Self {
        let tags = raw
            .map(|text| {
                TAG_SEPARATOR_RE
                    .split(text.trim())
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            raw: raw.map(str::to_string),
            tags,
        }
    }

    /// Substring test over the raw text.
    ///
    /// This is the rule used for flag derivation, so `default_version`
    /// also satisfies `contains_marker("default")`.
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.raw
            .as_deref()
            .is_some_and(|text| text.contains(marker))
    }

    /// Exact tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn is_sequence_level(&self) -> bool {
        self.contains_marker(SEQUENCE_LEVEL_MARKER)
    }

    pub fn is_default(&self) -> bool {
        self.contains_marker(DEFAULT_MARKER)
    }
}

/// One `coord_system` row exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordSystemRow {
    pub coord_system_id: CoordSystemId,
    pub species_id: SpeciesId,
    pub name: String,
    /// Nullable in storage.
    pub version: Option<String>,
    pub rank: i64,
    /// Nullable in storage.
    pub attrib: Option<String>,
}

impl CoordSystemRow {
    /// Checks the row shape required by derived records.
    pub fn validate(&self) -> Result<(), RowValidationError> {
        if self.name.trim().is_empty() {
            return Err(RowValidationError::EmptyName(self.coord_system_id));
        }
        if self.rank < 1 {
            return Err(RowValidationError::InvalidRank {
                coord_system_id: self.coord_system_id,
                rank: self.rank,
            });
        }
        Ok(())
    }

    pub fn attrib_tags(&self) -> AttribTags {
        AttribTags::parse(self.attrib.as_deref())
    }
}

/// Derived, read-only view of a coordinate system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateSystem {
    name: String,
    version: String,
    rank: i64,
    is_top_level: bool,
    is_sequence_level: bool,
    is_default: bool,
    species_id: SpeciesId,
    coord_system_id: CoordSystemId,
}

impl CoordinateSystem {
    /// Builds a record from a row and an explicit top-level decision.
    ///
    /// Sequence-level and default flags come from the row attribute text.
    pub fn from_row(row: &CoordSystemRow, is_top_level: bool) -> Self {
        let attribs = row.attrib_tags();
        Self {
            name: row.name.clone(),
            version: row.version.clone().unwrap_or_default(),
            rank: row.rank,
            is_top_level,
            is_sequence_level: attribs.is_sequence_level(),
            is_default: attribs.is_default(),
            species_id: row.species_id,
            coord_system_id: row.coord_system_id,
        }
    }

    /// Builds a record for a single-row lookup, where top level is decided
    /// by the stored name alone.
    pub fn from_lookup_row(row: &CoordSystemRow) -> Self {
        Self::from_row(row, row.name == TOP_LEVEL_SENTINEL)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty for unversioned systems.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rank(&self) -> i64 {
        self.rank
    }

    pub fn is_top_level(&self) -> bool {
        self.is_top_level
    }

    pub fn is_sequence_level(&self) -> bool {
        self.is_sequence_level
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn species_id(&self) -> SpeciesId {
        self.species_id
    }

    pub fn coord_system_id(&self) -> CoordSystemId {
        self.coord_system_id
    }
}

impl Display for CoordinateSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.version)
        }
    }
}
