//! Turns a table's plugin list into live plugin instances.
//!
//! Owns every plugin instance of one table, validates the plugin list
//! before anything is constructed, and memoizes the live list per
//! configured plugin list.

use crate::config::{PluginEntry, PluginSource};
use crate::error::{TableError, TableResult};
use crate::owner::Owner;
use crate::plugin::{AnyPlugin, PluginContext};
use crate::settings::{EngineSettings, FeatureAmbiguity};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tabula_types::TableId;
use tracing::{debug, info, warn};

/// Live plugins of a table, in configuration order.
pub type PluginList = Arc<[Arc<dyn AnyPlugin>]>;

/// Checks a plugin list without constructing or calling into any plugin.
///
/// - each plugin type appears at most once
/// - every `requires` entry is provided by some other configured plugin
/// - features provided more than once are reported per `ambiguity`
pub fn validate(entries: &[PluginEntry], ambiguity: FeatureAmbiguity) -> TableResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.plugin_type()) {
            return Err(TableError::DuplicatePlugin(entry.name().to_string()));
        }
    }

    for (index, entry) in entries.iter().enumerate() {
        for feature in entry.requires() {
            let provided = entries
                .iter()
                .enumerate()
                .any(|(other, candidate)| other != index && candidate.features().contains(&feature));
            if !provided {
                return Err(TableError::UnsatisfiedDependency {
                    plugin: entry.name().to_string(),
                    feature: feature.to_string(),
                });
            }
        }
    }

    let mut providers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in entries {
        for feature in entry.features() {
            providers.entry(feature).or_default().push(entry.name());
        }
    }
    for (feature, names) in providers.into_iter().filter(|(_, names)| names.len() > 1) {
        match ambiguity {
            FeatureAmbiguity::Allow => {}
            FeatureAmbiguity::Warn => {
                warn!(
                    feature,
                    providers = ?names,
                    "Feature provided by several plugins; the first configured one wins"
                );
            }
            FeatureAmbiguity::Deny => {
                return Err(TableError::AmbiguousFeature {
                    feature: feature.to_string(),
                    providers: names.into_iter().map(String::from).collect(),
                });
            }
        }
    }

    Ok(())
}

/// Per-table plugin instances.
pub(crate) struct PluginRegistry {
    source: Option<Arc<[PluginEntry]>>,
    active: PluginList,
    /// Every instance ever built for this table, by plugin type. Kept
    /// across reconfiguration so a class is constructed at most once.
    instances: HashMap<TypeId, Arc<dyn AnyPlugin>>,
}

impl PluginRegistry {
    pub(crate) fn new() -> Self {
        Self {
            source: None,
            active: Arc::from(Vec::<Arc<dyn AnyPlugin>>::new()),
            instances: HashMap::new(),
        }
    }

    /// Returns the live list for `entries`, rebuilding it only if
    /// `entries` is not the list it was last built from.
    pub(crate) fn resolve(
        &mut self,
        entries: &Arc<[PluginEntry]>,
        table_id: TableId,
        owner: Option<&Owner>,
        settings: &EngineSettings,
    ) -> TableResult<PluginList> {
        if let Some(source) = &self.source {
            if Arc::ptr_eq(source, entries) {
                return Ok(Arc::clone(&self.active));
            }
        }

        validate(entries, settings.feature_ambiguity)?;

        let mut active = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            let plugin = match &entry.source {
                PluginSource::Instance(plugin) => Arc::clone(plugin),
                PluginSource::Class {
                    plugin_type,
                    name,
                    construct,
                    ..
                } => match self.instances.get(plugin_type) {
                    Some(existing) => Arc::clone(existing),
                    None => {
                        let owner = owner.ok_or_else(|| TableError::MissingOwner(name.to_string()))?;
                        let ctx = PluginContext {
                            table_id,
                            owner,
                            settings,
                        };
                        let plugin = construct(&ctx)?;
                        info!(table_id = %table_id, plugin = %name, "Plugin instantiated");
                        self.instances.insert(*plugin_type, Arc::clone(&plugin));
                        plugin
                    }
                },
            };
            active.push(plugin);
        }

        debug!(
            table_id = %table_id,
            plugins = active.len(),
            "Plugin list rebuilt"
        );
        self.active = Arc::from(active);
        self.source = Some(Arc::clone(entries));
        Ok(Arc::clone(&self.active))
    }

    pub(crate) fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// First live plugin of the given type.
pub(crate) fn find(plugins: &PluginList, plugin_type: TypeId) -> Option<Arc<dyn AnyPlugin>> {
    plugins
        .iter()
        .find(|plugin| plugin.plugin_type() == plugin_type)
        .cloned()
}

/// First live plugin declaring `feature`, in configuration order.
pub(crate) fn provider_of(plugins: &PluginList, feature: &str) -> Option<Arc<dyn AnyPlugin>> {
    plugins
        .iter()
        .find(|plugin| plugin.declared_features().contains(&feature))
        .cloned()
}

/// Every feature provided by the live plugins, deduplicated, in order.
pub(crate) fn available_features(plugins: &PluginList) -> Vec<String> {
    let mut seen = HashSet::new();
    plugins
        .iter()
        .flat_map(|plugin| plugin.declared_features())
        .filter(|feature| seen.insert(feature.to_string()))
        .map(String::from)
        .collect()
}
