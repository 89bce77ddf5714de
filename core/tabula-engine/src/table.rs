//! The table entity and its builder.

use crate::column::Column;
use crate::config::{ColumnConfig, PreferencesConfig, TableConfig};
use crate::error::{TableError, TableResult};
use crate::hooks::{Cleanup, ColumnContext, RowContext};
use crate::meta::MetaStore;
use crate::owner::Owner;
use crate::plugin::{AnyPlugin, Plugin};
use crate::registry::{self, PluginList, PluginRegistry};
use crate::revision::Revision;
use crate::row::Row;
use crate::settings::EngineSettings;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tabula_preferences::{JsonFileAdapter, PreferencesStore};
use tabula_types::TableId;
use tracing::{debug, info};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Items derived from one configured list, remembered with that list.
struct Derived<S, T> {
    source: Option<Arc<[S]>>,
    items: Arc<[T]>,
}

impl<S, T> Derived<S, T> {
    fn empty() -> Self {
        Self {
            source: None,
            items: Arc::from(Vec::<T>::new()),
        }
    }

    fn is_current(&self, source: &Arc<[S]>) -> bool {
        self.source.as_ref().is_some_and(|s| Arc::ptr_eq(s, source))
    }
}

pub(crate) struct TableInner {
    pub(crate) id: TableId,
    owner: Option<Owner>,
    settings: EngineSettings,
    pub(crate) store: Arc<MetaStore>,
    preferences: Arc<PreferencesStore>,
    revision: Revision,
    config: RwLock<TableConfig>,
    registry: Mutex<PluginRegistry>,
    columns: Mutex<Derived<ColumnConfig, Column>>,
    rows: Mutex<Derived<Value, Row>>,
}

impl Drop for TableInner {
    fn drop(&mut self) {
        let dropped = self.store.forget_table(self.id);
        debug!(table_id = %self.id, metas = dropped, "Table dropped");
    }
}

/// Handle to a table. Clones share the same table.
///
/// Equality is by identity key, so any two handles to the same table
/// compare equal however they were obtained.
#[derive(Clone)]
pub struct Table {
    pub(crate) inner: Arc<TableInner>,
}

impl Table {
    pub fn builder(config: TableConfig) -> TableBuilder {
        TableBuilder::new(config)
    }

    /// Builds a table with default settings, no owner and the shared store.
    pub fn new(config: TableConfig) -> TableResult<Self> {
        TableBuilder::new(config).build()
    }

    pub fn id(&self) -> TableId {
        self.inner.id
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.inner.owner.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    pub fn store(&self) -> &Arc<MetaStore> {
        &self.inner.store
    }

    pub fn preferences(&self) -> &Arc<PreferencesStore> {
        &self.inner.preferences
    }

    pub fn revision(&self) -> &Revision {
        &self.inner.revision
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> TableConfig {
        self.inner.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the configuration.
    ///
    /// A new plugin list is validated before anything changes. Plugin
    /// instances and their metas survive: classes already built for this
    /// table are reused, and options are read fresh on every access.
    /// Columns and rows are rebuilt on next access if their lists changed.
    pub fn apply(&self, config: TableConfig) -> TableResult<()> {
        let plugins_changed = {
            let current = self.inner.config.read().unwrap_or_else(PoisonError::into_inner);
            !Arc::ptr_eq(&current.plugins, &config.plugins)
        };
        if plugins_changed {
            registry::validate(&config.plugins, self.inner.settings.feature_ambiguity)?;
        }

        *self.inner.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        let revision = self.inner.revision.bump();
        debug!(table_id = %self.inner.id, revision, plugins_changed, "Configuration applied");
        Ok(())
    }

    /// Live plugins in configuration order, constructing any not built yet.
    pub fn plugins(&self) -> TableResult<PluginList> {
        let entries = Arc::clone(&self.inner.config.read().unwrap_or_else(PoisonError::into_inner).plugins);
        lock(&self.inner.registry).resolve(
            &entries,
            self.inner.id,
            self.inner.owner.as_ref(),
            &self.inner.settings,
        )
    }

    /// The live instance of plugin type `P`, if configured.
    pub fn plugin_of<P: Plugin>(&self) -> TableResult<Option<Arc<P>>> {
        let plugins = self.plugins()?;
        Ok(registry::find(&plugins, TypeId::of::<P>())
            .and_then(|plugin| plugin.into_any().downcast::<P>().ok()))
    }

    /// The live instance of `plugin_type`, or `UnregisteredPlugin`.
    pub(crate) fn require_plugin(&self, plugin_type: TypeId, name: &str) -> TableResult<Arc<dyn AnyPlugin>> {
        let plugins = self.plugins()?;
        registry::find(&plugins, plugin_type).ok_or_else(|| TableError::UnregisteredPlugin {
            table_id: self.inner.id.to_string(),
            plugin: name.to_string(),
        })
    }

    /// Number of plugin instances ever constructed by this table.
    pub fn constructed_plugin_count(&self) -> usize {
        lock(&self.inner.registry).instance_count()
    }

    /// Columns for the current column definitions.
    ///
    /// The same `Column` objects are returned until the column list is
    /// replaced, at which point every column is recreated.
    pub fn columns(&self) -> Arc<[Column]> {
        let source = Arc::clone(&self.inner.config.read().unwrap_or_else(PoisonError::into_inner).columns);
        let mut derived = lock(&self.inner.columns);
        if derived.is_current(&source) {
            return Arc::clone(&derived.items);
        }

        let table = Arc::downgrade(&self.inner);
        let items: Arc<[Column]> = source
            .iter()
            .enumerate()
            .map(|(index, config)| Column::new(Weak::clone(&table), self, index, config.clone()))
            .collect();
        debug!(table_id = %self.inner.id, columns = items.len(), "Columns rebuilt");
        let previous = std::mem::replace(&mut derived.items, Arc::clone(&items));
        derived.source = Some(source);
        drop(derived);
        drop(previous);
        items
    }

    /// Rows for the current data. Rebuilt when the data list is replaced.
    pub fn rows(&self) -> Arc<[Row]> {
        let source = Arc::clone(&self.inner.config.read().unwrap_or_else(PoisonError::into_inner).data);
        let mut derived = lock(&self.inner.rows);
        if derived.is_current(&source) {
            return Arc::clone(&derived.items);
        }

        let table = Arc::downgrade(&self.inner);
        let items: Arc<[Row]> = (0..source.len())
            .map(|index| Row::new(Weak::clone(&table), self, index, Arc::clone(&source)))
            .collect();
        debug!(table_id = %self.inner.id, rows = items.len(), "Rows rebuilt");
        let previous = std::mem::replace(&mut derived.items, Arc::clone(&items));
        derived.source = Some(source);
        drop(derived);
        drop(previous);
        items
    }

    pub fn column(&self, key: &str) -> Option<Column> {
        self.columns().iter().find(|c| c.key().as_str() == key).cloned()
    }

    /// Drops every table-scoped meta this table owns.
    ///
    /// Plugins are untouched; metas are rebuilt on next access.
    pub fn teardown(&self) {
        let dropped = self.inner.store.forget_table(self.inner.id);
        info!(table_id = %self.inner.id, metas = dropped, "Table metadata torn down");
    }

    /// Runs every plugin's header-cell hook for `column`.
    pub fn attach_header_cell(&self, element: &dyn Any, column: &Column) -> TableResult<Cleanup> {
        let ctx = ColumnContext { column, table: self };
        let destructors = self
            .plugins()?
            .iter()
            .filter_map(|plugin| plugin.run_header_cell_hook(element, &ctx))
            .collect();
        Ok(Cleanup::new(destructors))
    }

    pub fn attach_row(&self, element: &dyn Any, row: &Row) -> TableResult<Cleanup> {
        let ctx = RowContext { row, table: self };
        let destructors = self
            .plugins()?
            .iter()
            .filter_map(|plugin| plugin.run_row_hook(element, &ctx))
            .collect();
        Ok(Cleanup::new(destructors))
    }

    pub fn attach_container(&self, element: &dyn Any) -> TableResult<Cleanup> {
        let destructors = self
            .plugins()?
            .iter()
            .filter_map(|plugin| plugin.run_container_hook(element, self))
            .collect();
        Ok(Cleanup::new(destructors))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Table {}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("id", &self.inner.id)
            .field("revision", &self.inner.revision.get())
            .finish_non_exhaustive()
    }
}

/// Builds a [`Table`].
pub struct TableBuilder {
    config: TableConfig,
    owner: Option<Owner>,
    store: Option<Arc<MetaStore>>,
    settings: EngineSettings,
}

impl TableBuilder {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            owner: None,
            store: None,
            settings: EngineSettings::default(),
        }
    }

    /// Application context handed to plugins the engine constructs.
    #[must_use]
    pub fn owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Metadata store to use instead of [`MetaStore::shared`].
    #[must_use]
    pub fn store(mut self, store: Arc<MetaStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates the plugin list and opens preferences. No plugin is
    /// constructed until something asks for it.
    pub fn build(self) -> TableResult<Table> {
        registry::validate(&self.config.plugins, self.settings.feature_ambiguity)?;
        let preferences = open_preferences(self.config.preferences.as_ref(), &self.settings)?;

        let id = TableId::new();
        info!(
            table_id = %id,
            plugins = self.config.plugins.len(),
            columns = self.config.columns.len(),
            rows = self.config.data.len(),
            "Table created"
        );

        Ok(Table {
            inner: Arc::new(TableInner {
                id,
                owner: self.owner,
                settings: self.settings,
                store: self.store.unwrap_or_else(MetaStore::shared),
                preferences: Arc::new(preferences),
                revision: Revision::new(),
                config: RwLock::new(self.config),
                registry: Mutex::new(PluginRegistry::new()),
                columns: Mutex::new(Derived::empty()),
                rows: Mutex::new(Derived::empty()),
            }),
        })
    }
}

fn open_preferences(
    config: Option<&PreferencesConfig>,
    settings: &EngineSettings,
) -> TableResult<PreferencesStore> {
    let Some(config) = config else {
        return Ok(PreferencesStore::in_memory());
    };
    if let Some(adapter) = &config.adapter {
        return Ok(PreferencesStore::open(config.key.clone(), Arc::clone(adapter))?);
    }
    match &settings.preferences_dir {
        Some(dir) => Ok(PreferencesStore::open(
            config.key.clone(),
            Arc::new(JsonFileAdapter::new(dir)),
        )?),
        None => {
            debug!(key = %config.key, "No preferences adapter or directory, keeping preferences in memory");
            Ok(PreferencesStore::in_memory())
        }
    }
}
