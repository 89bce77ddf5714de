use crate::adapter::PreferencesAdapter;
use crate::error::PreferencesResult;
use crate::scoped::PreferenceScope;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// The whole preferences document of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesData {
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginPreferences>,
}

/// Values one plugin stored for the table and for each column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginPreferences {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub table: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, BTreeMap<String, Value>>,
}

impl PluginPreferences {
    fn bucket(&self, scope: &PreferenceScope) -> Option<&BTreeMap<String, Value>> {
        match scope {
            PreferenceScope::Table => Some(&self.table),
            PreferenceScope::Column(key) => self.columns.get(key.as_str()),
        }
    }

    fn bucket_mut(&mut self, scope: &PreferenceScope) -> &mut BTreeMap<String, Value> {
        match scope {
            PreferenceScope::Table => &mut self.table,
            PreferenceScope::Column(key) => self.columns.entry(key.to_string()).or_default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.table.is_empty() && self.columns.is_empty()
    }
}

/// In-memory preferences document for one table, backed by an optional adapter.
///
/// Reads never touch the adapter. Writes change memory only; callers flush
/// with [`persist`](Self::persist) (the scoped façade does this for them).
pub struct PreferencesStore {
    key: String,
    adapter: Option<Arc<dyn PreferencesAdapter>>,
    data: RwLock<PreferencesData>,
}

impl PreferencesStore {
    /// Opens the store for `key`, restoring whatever the adapter holds.
    pub fn open(key: impl Into<String>, adapter: Arc<dyn PreferencesAdapter>) -> PreferencesResult<Self> {
        let key = key.into();
        let data = adapter.restore(&key)?.unwrap_or_default();
        info!(key = %key, plugins = data.plugins.len(), "Preferences restored");
        Ok(Self {
            key,
            adapter: Some(adapter),
            data: RwLock::new(data),
        })
    }

    /// Creates a store that is never written anywhere.
    pub fn in_memory() -> Self {
        Self {
            key: String::new(),
            adapter: None,
            data: RwLock::new(PreferencesData::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_persistent(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn get(&self, plugin: &str, scope: &PreferenceScope, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.plugins
            .get(plugin)
            .and_then(|p| p.bucket(scope))
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }

    pub fn set(&self, plugin: &str, scope: &PreferenceScope, key: &str, value: Value) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.plugins
            .entry(plugin.to_string())
            .or_default()
            .bucket_mut(scope)
            .insert(key.to_string(), value);
    }

    /// Removes a value, pruning buckets left empty. Returns the old value.
    pub fn delete(&self, plugin: &str, scope: &PreferenceScope, key: &str) -> Option<Value> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let prefs = data.plugins.get_mut(plugin)?;
        let removed = match scope {
            PreferenceScope::Table => prefs.table.remove(key),
            PreferenceScope::Column(column) => {
                let bucket = prefs.columns.get_mut(column.as_str())?;
                let removed = bucket.remove(key);
                if bucket.is_empty() {
                    prefs.columns.remove(column.as_str());
                }
                removed
            }
        };
        if prefs.is_empty() {
            data.plugins.remove(plugin);
        }
        removed
    }

    /// Drops every value a plugin stored. Returns whether anything was removed.
    pub fn clear_plugin(&self, plugin: &str) -> bool {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.plugins.remove(plugin).is_some()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.plugins.keys().cloned().collect()
    }

    /// Returns a copy of the current document.
    pub fn snapshot(&self) -> PreferencesData {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Flushes the current document to the adapter. No-op without one.
    pub fn persist(&self) -> PreferencesResult<()> {
        let Some(adapter) = &self.adapter else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        adapter.persist(&self.key, &snapshot)?;
        debug!(key = %self.key, plugins = snapshot.plugins.len(), "Preferences persisted");
        Ok(())
    }

    /// Replaces the in-memory document with what the adapter holds.
    pub fn restore(&self) -> PreferencesResult<()> {
        let Some(adapter) = &self.adapter else {
            return Ok(());
        };
        let restored = adapter.restore(&self.key)?.unwrap_or_default();
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = restored;
        Ok(())
    }
}

impl std::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("key", &self.key)
            .field("persistent", &self.adapter.is_some())
            .finish_non_exhaustive()
    }
}
