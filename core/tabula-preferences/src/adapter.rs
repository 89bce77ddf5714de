//! Storage adapters for preferences documents.

use crate::error::{PreferencesError, PreferencesResult};
use crate::store::PreferencesData;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Loads and saves whole preferences documents by key.
pub trait PreferencesAdapter: Send + Sync {
    /// Returns the saved document, or `None` if nothing was saved under `key`.
    fn restore(&self, key: &str) -> PreferencesResult<Option<PreferencesData>>;

    fn persist(&self, key: &str, data: &PreferencesData) -> PreferencesResult<()>;
}

/// Keeps documents in process memory. Useful for tests and ephemeral tables.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    saved: Mutex<HashMap<String, PreferencesData>>,
    writes: Mutex<usize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document as if it had been persisted earlier.
    pub fn with_document(key: impl Into<String>, data: PreferencesData) -> Self {
        let adapter = Self::default();
        adapter
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), data);
        adapter
    }

    pub fn saved(&self, key: &str) -> Option<PreferencesData> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// Number of `persist` calls served so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferencesAdapter for MemoryAdapter {
    fn restore(&self, key: &str) -> PreferencesResult<Option<PreferencesData>> {
        Ok(self.saved(key))
    }

    fn persist(&self, key: &str, data: &PreferencesData) -> PreferencesResult<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), data.clone());
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Stores each document as `<dir>/<key>.json`.
///
/// Writes go to a temporary sibling file first and are renamed into
/// place, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileAdapter {
    dir: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PreferencesResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PreferencesError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl PreferencesAdapter for JsonFileAdapter {
    fn restore(&self, key: &str) -> PreferencesResult<Option<PreferencesData>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!("No preferences file at {:?}", path);
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!("Failed to parse preferences file {:?}: {}", path, e);
                Err(e.into())
            }
        }
    }

    fn persist(&self, key: &str, data: &PreferencesData) -> PreferencesResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
