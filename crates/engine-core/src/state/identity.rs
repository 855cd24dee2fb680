use crate::{
    error::StateError,
    state::fs::{read_optional, write_atomic},
};
use std::{
    collections::{BTreeMap, HashSet},
    path::PathBuf,
};
use tracing::{debug, warn};

/// Persisted mapping from legacy record id to newly generated record id.
///
/// The in-memory map is a cache of the JSON snapshot on disk. Entries are
/// only ever added; an existing mapping is never overwritten.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
    /// Every new id that some legacy id maps to.
    targets: HashSet<String>,
    dirty: bool,
}

impl IdentityMap {
    /// Map that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the snapshot at `path`; a missing file yields an empty map.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let entries: BTreeMap<String, String> = match read_optional(&path)
            .await
            .map_err(|source| StateError::Read {
                path: path.clone(),
                source,
            })? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                StateError::CorruptIdentityMap {
                    path: path.clone(),
                    source,
                }
            })?,
            None => BTreeMap::new(),
        };

        debug!(path = %path.display(), entries = entries.len(), "Identity map loaded");
        let targets = entries.values().cloned().collect();
        Ok(Self {
            path: Some(path),
            entries,
            targets,
            dirty: false,
        })
    }

    pub fn get(&self, legacy_id: &str) -> Option<&str> {
        self.entries.get(legacy_id).map(String::as_str)
    }

    pub fn contains(&self, legacy_id: &str) -> bool {
        self.entries.contains_key(legacy_id)
    }

    /// Whether any legacy id is already mapped to `new_id`.
    pub fn maps_to(&self, new_id: &str) -> bool {
        self.targets.contains(new_id)
    }

    /// Records a mapping. Returns `false` if `legacy_id` was already mapped,
    /// in which case the existing value is kept.
    pub fn insert(&mut self, legacy_id: impl Into<String>, new_id: impl Into<String>) -> bool {
        let legacy_id = legacy_id.into();
        if let Some(existing) = self.entries.get(&legacy_id) {
            let new_id = new_id.into();
            if *existing != new_id {
                warn!(
                    legacy_id = %legacy_id,
                    existing = %existing,
                    rejected = %new_id,
                    "Legacy id already mapped, keeping existing mapping"
                );
            }
            return false;
        }

        let new_id = new_id.into();
        self.targets.insert(new_id.clone());
        self.entries.insert(legacy_id, new_id);
        self.dirty = true;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the snapshot if anything changed since the last write.
    pub async fn persist(&mut self) -> Result<(), StateError> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic(path, &bytes)
            .await
            .map_err(|source| StateError::Write {
                path: path.clone(),
                source,
            })?;

        self.dirty = false;
        debug!(path = %path.display(), entries = self.entries.len(), "Identity map persisted");
        Ok(())
    }
}
