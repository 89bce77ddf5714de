//! Table configuration: data, column definitions, plugin list, preferences.
//!
//! Every list is held behind an `Arc` so the table can tell cheaply
//! whether a re-applied configuration actually changed it. Derived state
//! (columns, rows, live plugins) is rebuilt only for lists whose `Arc`
//! differs from the one it was built from.

use crate::error::TableResult;
use crate::plugin::{AnyPlugin, Plugin, PluginClass, PluginContext};
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tabula_preferences::PreferencesAdapter;
use tabula_types::ColumnKey;

/// Zero-argument function producing a plugin's (possibly partial) options.
/// `Value::Null` counts as "no options".
pub type OptionsProvider = Arc<dyn Fn() -> Value + Send + Sync>;

type Constructor = fn(&PluginContext<'_>) -> TableResult<Arc<dyn AnyPlugin>>;

fn construct_erased<P: PluginClass>(ctx: &PluginContext<'_>) -> TableResult<Arc<dyn AnyPlugin>> {
    Ok(Arc::new(P::construct(ctx)?))
}

#[derive(Clone)]
pub(crate) enum PluginSource {
    /// Built by the engine on first use.
    Class {
        plugin_type: TypeId,
        name: &'static str,
        features: &'static [&'static str],
        requires: &'static [&'static str],
        construct: Constructor,
    },
    /// Built by the caller; used as-is.
    Instance(Arc<dyn AnyPlugin>),
}

/// One entry of a table's plugin list.
#[derive(Clone)]
pub struct PluginEntry {
    pub(crate) source: PluginSource,
    pub(crate) options: Option<OptionsProvider>,
}

impl PluginEntry {
    /// A plugin class with default options.
    pub fn class<P: PluginClass>() -> Self {
        Self {
            source: PluginSource::Class {
                plugin_type: TypeId::of::<P>(),
                name: P::NAME,
                features: P::FEATURES,
                requires: P::REQUIRES,
                construct: construct_erased::<P>,
            },
            options: None,
        }
    }

    /// A plugin class with an options provider.
    pub fn class_with<P: PluginClass>(options: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::class::<P>().with_options(options)
    }

    /// A ready-made plugin instance.
    pub fn instance<P: Plugin>(plugin: P) -> Self {
        Self {
            source: PluginSource::Instance(Arc::new(plugin)),
            options: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.options = Some(Arc::new(options));
        self
    }

    pub fn plugin_type(&self) -> TypeId {
        match &self.source {
            PluginSource::Class { plugin_type, .. } => *plugin_type,
            PluginSource::Instance(plugin) => plugin.plugin_type(),
        }
    }

    pub fn name(&self) -> &str {
        match &self.source {
            PluginSource::Class { name, .. } => name,
            PluginSource::Instance(plugin) => plugin.plugin_name(),
        }
    }

    /// Declared features, read without constructing anything.
    pub fn features(&self) -> Vec<&str> {
        match &self.source {
            PluginSource::Class { features, .. } => features.to_vec(),
            PluginSource::Instance(plugin) => plugin.declared_features(),
        }
    }

    pub fn requires(&self) -> Vec<&str> {
        match &self.source {
            PluginSource::Class { requires, .. } => requires.to_vec(),
            PluginSource::Instance(plugin) => plugin.declared_requires(),
        }
    }

    pub(crate) fn options_provider(&self) -> Option<&OptionsProvider> {
        self.options.as_ref()
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            PluginSource::Class { .. } => "class",
            PluginSource::Instance(_) => "instance",
        };
        f.debug_struct("PluginEntry")
            .field("name", &self.name())
            .field("kind", &kind)
            .field("has_options", &self.options.is_some())
            .finish()
    }
}

/// Column-level options for one plugin.
#[derive(Clone)]
pub struct PluginOptions {
    pub(crate) plugin_type: TypeId,
    pub(crate) plugin_name: &'static str,
    pub(crate) provider: OptionsProvider,
}

impl PluginOptions {
    pub fn of<P: Plugin>(provider: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            plugin_type: TypeId::of::<P>(),
            plugin_name: P::NAME,
            provider: Arc::new(provider),
        }
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions").field("plugin", &self.plugin_name).finish()
    }
}

/// User definition of one column.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub key: ColumnKey,
    pub name: Option<String>,
    pub plugins: Vec<PluginOptions>,
}

impl ColumnConfig {
    pub fn new(key: impl Into<String>) -> TableResult<Self> {
        Ok(Self {
            key: ColumnKey::new(key)?,
            name: None,
            plugins: Vec::new(),
        })
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn plugin(mut self, options: PluginOptions) -> Self {
        self.plugins.push(options);
        self
    }

    /// Display name, defaulting to the key.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.key.as_str())
    }
}

/// Where a table keeps its preferences.
#[derive(Clone)]
pub struct PreferencesConfig {
    pub key: String,
    /// `None` falls back to a JSON file under the engine's
    /// `preferences_dir`, or to memory if that is unset too.
    pub adapter: Option<Arc<dyn PreferencesAdapter>>,
}

impl fmt::Debug for PreferencesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencesConfig")
            .field("key", &self.key)
            .field("adapter", &self.adapter.is_some())
            .finish()
    }
}

/// Everything a table is built from.
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    pub data: Arc<[Value]>,
    pub columns: Arc<[ColumnConfig]>,
    pub plugins: Arc<[PluginEntry]>,
    /// Read once when the table is built.
    pub preferences: Option<PreferencesConfig>,
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<Arc<[Value]>>) -> Self {
        self.data = data.into();
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: impl Into<Arc<[ColumnConfig]>>) -> Self {
        self.columns = columns.into();
        self
    }

    #[must_use]
    pub fn plugins(mut self, plugins: impl Into<Arc<[PluginEntry]>>) -> Self {
        self.plugins = plugins.into();
        self
    }

    #[must_use]
    pub fn preferences(mut self, key: impl Into<String>, adapter: Arc<dyn PreferencesAdapter>) -> Self {
        self.preferences = Some(PreferencesConfig {
            key: key.into(),
            adapter: Some(adapter),
        });
        self
    }

    #[must_use]
    pub fn preferences_key(mut self, key: impl Into<String>) -> Self {
        self.preferences = Some(PreferencesConfig {
            key: key.into(),
            adapter: None,
        });
        self
    }

    /// Options provider configured for plugin type `plugin_type`, if any.
    pub(crate) fn options_for(&self, plugin_type: TypeId) -> Option<OptionsProvider> {
        self.plugins
            .iter()
            .find(|entry| entry.plugin_type() == plugin_type)
            .and_then(|entry| entry.options_provider().cloned())
    }
}
