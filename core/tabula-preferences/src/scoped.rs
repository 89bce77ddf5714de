use crate::error::PreferencesResult;
use crate::store::PreferencesStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tabula_types::ColumnKey;

/// Second level of the preferences path: the table itself or one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreferenceScope {
    Table,
    Column(ColumnKey),
}

impl fmt::Display for PreferenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => f.write_str("table"),
            Self::Column(key) => write!(f, "column:{key}"),
        }
    }
}

/// Preferences of one plugin in one scope.
///
/// Every mutation is written to memory first and then persisted, so a
/// following `get` sees the new value even if persisting fails. The
/// persistence error is still returned to the caller.
#[derive(Clone)]
pub struct ScopedPreferences {
    store: Arc<PreferencesStore>,
    plugin: String,
    scope: PreferenceScope,
}

impl ScopedPreferences {
    pub fn new(store: Arc<PreferencesStore>, plugin: impl Into<String>, scope: PreferenceScope) -> Self {
        Self {
            store,
            plugin: plugin.into(),
            scope,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn scope(&self) -> &PreferenceScope {
        &self.scope
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(&self.plugin, &self.scope, key)
    }

    /// Reads a value and decodes it, treating a mismatched shape as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> PreferencesResult<()> {
        self.store.set(&self.plugin, &self.scope, key, value.into());
        self.store.persist()
    }

    /// Deletes a value and persists. Returns the removed value, if any.
    pub fn delete(&self, key: &str) -> PreferencesResult<Option<Value>> {
        let removed = self.store.delete(&self.plugin, &self.scope, key);
        self.store.persist()?;
        Ok(removed)
    }
}

impl fmt::Debug for ScopedPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedPreferences")
            .field("plugin", &self.plugin)
            .field("scope", &self.scope)
            .finish()
    }
}
