//! Durable record of combinations proven feasible.
//!
//! One cache belongs to one (instance, container) unit. It is loaded before
//! the resolution sweep, flushed after every resolution and once more at the
//! end of the sweep. Only successes are stored: infeasibility at one
//! resolution says nothing about finer ones.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};
use crate::layout::OutputLayout;
use crate::model::{Combination, Container, Position};
use crate::report::ContainerDimensions;

/// A confirmed-feasible combination and how it was packed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeasibilityRecord {
    /// Always true; kept so the stored form is self-describing.
    pub is_feasible: bool,
    pub combination: Vec<String>,
    /// Item key to lower-left corner.
    pub placement: IndexMap<String, Position>,
    /// Resolution of the first successful oracle call.
    pub resolution: u64,
}

impl FeasibilityRecord {
    pub fn new(combination: &Combination, placement: IndexMap<String, Position>, resolution: u64) -> Self {
        Self {
            is_feasible: true,
            combination: combination.keys().to_vec(),
            placement,
            resolution,
        }
    }
}

/// Stored form: the container the records were proven for, then the records.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CacheFile {
    container: ContainerDimensions,
    records: IndexMap<String, FeasibilityRecord>,
}

/// Feasibility cache of one unit, backed by a JSON file.
#[derive(Debug)]
pub struct FeasibilityCache {
    path: PathBuf,
    file: CacheFile,
    /// Whether the file on disk is behind the records in memory.
    dirty: bool,
}

impl FeasibilityCache {
    /// An empty cache for `container` that will be flushed to `path`.
    pub fn empty(path: impl Into<PathBuf>, container: &Container) -> Self {
        Self {
            path: path.into(),
            file: CacheFile {
                container: ContainerDimensions {
                    length: container.length,
                    width: container.width,
                },
                records: IndexMap::new(),
            },
            dirty: true,
        }
    }

    /// Load the cache of `container` stored at `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file,
    /// or one written for a container of another size, is reported as
    /// `CacheCorrupt`.
    pub fn try_load(layout: &OutputLayout, path: &Path, container: &Container) -> Result<Self> {
        let corrupt = |reason: String| SearchError::CacheCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let data = match layout.read(path) {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(Self::empty(path, container)),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        let mut file: CacheFile = serde_json::from_slice(&data).map_err(|e| corrupt(e.to_string()))?;
        if file.container.length != container.length || file.container.width != container.width {
            return Err(corrupt(format!(
                "written for a {}x{} container, expected {}",
                file.container.length,
                file.container.width,
                container.size_label()
            )));
        }

        // Entries that do not describe a success are not trusted.
        let before = file.records.len();
        file.records.retain(|_, record| record.is_feasible);

        Ok(Self {
            path: path.to_path_buf(),
            dirty: file.records.len() != before,
            file,
        })
    }

    /// Load the cache, falling back to an empty one if it is corrupt.
    pub fn load(layout: &OutputLayout, path: &Path, container: &Container) -> Self {
        match Self::try_load(layout, path, container) {
            Ok(cache) => {
                log::debug!("Loaded {} cached feasible combinations from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                log::warn!("{}; starting with an empty cache", e);
                Self::empty(path, container)
            }
        }
    }

    pub fn get(&self, combo: &Combination) -> Option<&FeasibilityRecord> {
        self.file.records.get(&combo.canonical_key())
    }

    /// Store a success. The first success for a combination wins.
    ///
    /// Returns false if the combination was already cached.
    pub fn put(&mut self, combo: &Combination, record: FeasibilityRecord) -> bool {
        let key = combo.canonical_key();
        if self.file.records.contains_key(&key) {
            return false;
        }
        self.file.records.insert(key, record);
        self.dirty = true;
        true
    }

    /// Persist the full mapping if it changed since the last load or flush.
    pub fn flush(&mut self, layout: &OutputLayout) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        layout.write_json(&self.path, &self.file)?;
        self.dirty = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.file.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.records.is_empty()
    }
}
