//! Coordinate-system use-case service.
//!
//! # Responsibility
//! - Derive `CoordinateSystem` records (flags included) from repository rows.
//! - Cache one scan per species in a bounded LRU owned by the instance.
//! - Resolve names, aliases, ranks and ids against the cached scan.
//!
//! # Invariants
//! - A species is scanned at most once while its cache slot is live.
//! - Cached views are never mutated; callers receive clones.
//! - `toplevel`/`seqlevel` aliases never trigger a scan.
//! - "No match" is `Ok(None)` plus a warning, never an error.

use crate::model::coord_system::{
    CoordSystemId, CoordSystemRow, CoordinateSystem, SpeciesId, DEFAULT_VERSION_MARKER,
};
use crate::repo::coord_system_repo::{CoordSystemRepository, RepoError};
use crate::service::cache::LruCache;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;

/// Alias resolving to the lowest-ranked system of a species.
pub const TOP_LEVEL_ALIAS: &str = "toplevel";
/// Alias resolving to the system sequence is stored at.
pub const SEQUENCE_LEVEL_ALIAS: &str = "seqlevel";

const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(2) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for coordinate-system use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// An alias was requested before the species was scanned.
    NotInitialized {
        alias: &'static str,
        species_id: SpeciesId,
    },
    /// Rank arguments must be non-negative.
    InvalidRank(i64),
    NoSequenceLevel(SpeciesId),
    MultipleSequenceLevels {
        species_id: SpeciesId,
        count: usize,
    },
    /// Persistence-layer failure, passed through unchanged.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized { alias, species_id } => write!(
                f,
                "`{alias}` requested before coordinate systems of species {species_id} were loaded"
            ),
            Self::InvalidRank(rank) => {
                write!(f, "rank argument must be a non-negative integer, got {rank}")
            }
            Self::NoSequenceLevel(species_id) => write!(
                f,
                "no sequence_level coord_system is defined for species {species_id}"
            ),
            Self::MultipleSequenceLevels { species_id, count } => write!(
                f,
                "{count} sequence_level coord_systems are defined for species {species_id}; only one is supported"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Tunables for [`CoordSystemService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Number of species scans kept before the least recently used is evicted.
    pub cache_capacity: NonZeroUsize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// One cached species scan.
#[derive(Debug, Clone)]
struct SpeciesView {
    /// Rows as read, same order as `records`.
    rows: Vec<CoordSystemRow>,
    records: Vec<CoordinateSystem>,
    top_level: Option<CoordinateSystem>,
    sequence_level: Option<CoordinateSystem>,
}

impl SpeciesView {
    fn from_rows(species_id: SpeciesId, rows: Vec<CoordSystemRow>) -> Self {
        let mut records: Vec<CoordinateSystem> = Vec::with_capacity(rows.len());
        let mut sequence_level: Option<CoordinateSystem> = None;

        for (index, row) in rows.iter().enumerate() {
            let record = CoordinateSystem::from_row(row, index == 0);
            if records.last().is_some_and(|previous| previous.rank() == row.rank) {
                warn!(
                    "event=coord_system_scan module=service status=duplicate_rank species_id={species_id} rank={}",
                    row.rank
                );
            }
            if record.is_sequence_level() {
                match &sequence_level {
                    None => sequence_level = Some(record.clone()),
                    Some(first) => warn!(
                        "event=coord_system_scan module=service status=extra_sequence_level species_id={species_id} kept={} ignored={}",
                        first.coord_system_id(),
                        record.coord_system_id()
                    ),
                }
            }
            records.push(record);
        }

        Self {
            top_level: records.first().cloned(),
            rows,
            records,
            sequence_level,
        }
    }

    fn lookup_record(&self, index: usize) -> CoordinateSystem {
        CoordinateSystem::from_lookup_row(&self.rows[index])
    }
}

/// Use-case service over a coordinate-system repository.
pub struct CoordSystemService<R: CoordSystemRepository> {
    repo: R,
    cache: LruCache<SpeciesId, SpeciesView>,
}

impl<R: CoordSystemRepository> CoordSystemService<R> {
    /// Creates a service with the default cache capacity.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, ServiceConfig::default())
    }

    pub fn with_config(repo: R, config: ServiceConfig) -> Self {
        Self {
            repo,
            cache: LruCache::new(config.cache_capacity),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// All coordinate systems of a species in ascending rank order.
    ///
    /// # Contract
    /// - Queries the repository only when the species is not cached.
    /// - `is_top_level` is set on the first record only.
    /// - Remembers the top-level and first sequence-level record.
    pub fn get_all(&mut self, species_id: SpeciesId) -> ServiceResult<Vec<CoordinateSystem>> {
        Ok(self.view(species_id)?.records.clone())
    }

    /// Resolves a coordinate system by alias or by name and optional version.
    ///
    /// # Contract
    /// - `toplevel`/`seqlevel` return the records remembered by the last scan
    ///   of `species_id`; without one, `ServiceError::NotInitialized`.
    /// - Names compare case-insensitively. Without a version the
    ///   default-marked candidate wins; with one, the matching version wins.
    ///   Ties go to the lowest rank.
    /// - Returned flags follow single-record lookup rules
    ///   (see `CoordinateSystem::from_lookup_row`).
    pub fn get_by_name(
        &mut self,
        name: &str,
        version: Option<&str>,
        species_id: SpeciesId,
    ) -> ServiceResult<Option<CoordinateSystem>> {
        if name == SEQUENCE_LEVEL_ALIAS {
            return self.remembered_level(SEQUENCE_LEVEL_ALIAS, species_id);
        }
        if name == TOP_LEVEL_ALIAS {
            return self.remembered_level(TOP_LEVEL_ALIAS, species_id);
        }

        let version = version.filter(|value| !value.is_empty());
        let view = self.view(species_id)?;

        // Records are stored in (species_id, rank) order already.
        let found = view
            .records
            .iter()
            .position(|record| {
                record.name().eq_ignore_ascii_case(name)
                    && match version {
                        Some(version) => record.version().eq_ignore_ascii_case(version),
                        None => record.is_default(),
                    }
            })
            .map(|index| view.lookup_record(index));

        if found.is_none() {
            match version {
                Some(version) => warn!(
                    "event=coord_system_lookup module=service status=not_found species_id={species_id} name={name} version={version}"
                ),
                None => warn!(
                    "event=coord_system_lookup module=service status=not_found species_id={species_id} name={name}"
                ),
            }
        }

        Ok(found)
    }

    /// Resolves a coordinate system by rank; rank 0 is the top-level system.
    pub fn get_by_rank(
        &mut self,
        rank: i64,
        species_id: SpeciesId,
    ) -> ServiceResult<Option<CoordinateSystem>> {
        if rank < 0 {
            return Err(ServiceError::InvalidRank(rank));
        }

        let view = self.view(species_id)?;
        let found = if rank == 0 {
            view.top_level.clone()
        } else {
            view.records
                .iter()
                .find(|record| record.rank() == rank)
                .cloned()
        };

        if found.is_none() {
            warn!(
                "event=coord_system_lookup module=service status=not_found species_id={species_id} rank={rank}"
            );
        }
        Ok(found)
    }

    /// Resolves a coordinate system by primary key.
    ///
    /// Served from any cached species scan first, then from storage.
    pub fn get_by_id(
        &self,
        coord_system_id: CoordSystemId,
    ) -> ServiceResult<Option<CoordinateSystem>> {
        for view in self.cache.values() {
            if let Some(index) = view
                .records
                .iter()
                .position(|record| record.coord_system_id() == coord_system_id)
            {
                debug!(
                    "event=coord_system_lookup module=service status=hit coord_system_id={coord_system_id}"
                );
                return Ok(Some(view.lookup_record(index)));
            }
        }

        let row = self.repo.fetch_by_id(coord_system_id)?;
        if row.is_none() {
            warn!(
                "event=coord_system_lookup module=service status=not_found coord_system_id={coord_system_id}"
            );
        }
        Ok(row.as_ref().map(CoordinateSystem::from_lookup_row))
    }

    /// The single sequence-level system of a species.
    ///
    /// # Errors
    /// - `NoSequenceLevel` when no record carries the marker.
    /// - `MultipleSequenceLevels` when more than one does.
    pub fn fetch_sequence_level(&mut self, species_id: SpeciesId) -> ServiceResult<CoordinateSystem> {
        let view = self.view(species_id)?;
        let mut sequence_levels = view
            .records
            .iter()
            .filter(|record| record.is_sequence_level());

        let Some(first) = sequence_levels.next() else {
            return Err(ServiceError::NoSequenceLevel(species_id));
        };
        let extra = sequence_levels.count();
        if extra > 0 {
            return Err(ServiceError::MultipleSequenceLevels {
                species_id,
                count: extra + 1,
            });
        }
        Ok(first.clone())
    }

    /// Version of the first record tagged `default_version`, if any.
    pub fn default_version(&mut self, species_id: SpeciesId) -> ServiceResult<Option<String>> {
        let view = self.view(species_id)?;
        let version = view
            .rows
            .iter()
            .filter(|row| row.attrib_tags().contains_marker(DEFAULT_VERSION_MARKER))
            .filter_map(|row| row.version.as_deref())
            .find(|version| !version.is_empty())
            .map(str::to_string);

        if version.is_none() {
            warn!(
                "event=coord_system_default_version module=service status=not_found species_id={species_id}"
            );
        }
        Ok(version)
    }

    /// Default-marked systems of a species in rank order.
    pub fn get_all_default(&mut self, species_id: SpeciesId) -> ServiceResult<Vec<CoordinateSystem>> {
        self.filtered(species_id, true)
    }

    /// Systems of a species without the default marker, in rank order.
    pub fn get_all_nondefault(
        &mut self,
        species_id: SpeciesId,
    ) -> ServiceResult<Vec<CoordinateSystem>> {
        self.filtered(species_id, false)
    }

    /// Drops the cached scan of one species. Returns whether one existed.
    pub fn invalidate(&mut self, species_id: SpeciesId) -> bool {
        let removed = self.cache.remove(&species_id).is_some();
        if removed {
            info!("event=coord_system_cache module=service status=invalidated species_id={species_id}");
        }
        removed
    }

    /// Drops every cached scan.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        info!("event=coord_system_cache module=service status=cleared");
    }

    pub fn is_cached(&self, species_id: SpeciesId) -> bool {
        self.cache.contains(&species_id)
    }

    pub fn cache_capacity(&self) -> NonZeroUsize {
        self.cache.capacity()
    }

    fn filtered(&mut self, species_id: SpeciesId, default: bool) -> ServiceResult<Vec<CoordinateSystem>> {
        Ok(self
            .view(species_id)?
            .records
            .iter()
            .filter(|record| record.is_default() == default)
            .cloned()
            .collect())
    }

    fn remembered_level(
        &self,
        alias: &'static str,
        species_id: SpeciesId,
    ) -> ServiceResult<Option<CoordinateSystem>> {
        let Some(view) = self.cache.peek(&species_id) else {
            return Err(ServiceError::NotInitialized { alias, species_id });
        };

        let level = if alias == TOP_LEVEL_ALIAS {
            view.top_level.clone()
        } else {
            view.sequence_level.clone()
        };
        if level.is_none() {
            warn!(
                "event=coord_system_lookup module=service status=not_found species_id={species_id} name={alias}"
            );
        }
        Ok(level)
    }

    fn view(&mut self, species_id: SpeciesId) -> ServiceResult<&SpeciesView> {
        let repo = &self.repo;
        let mut loaded = false;
        let view = self
            .cache
            .get_or_try_insert_with(species_id, || -> ServiceResult<SpeciesView> {
                loaded = true;
                let rows = repo.fetch_all(species_id)?;
                Ok(SpeciesView::from_rows(species_id, rows))
            })?;

        let status = if loaded { "miss" } else { "hit" };
        debug!("event=coord_system_cache module=service status={status} species_id={species_id}");
        Ok(view)
    }
}
