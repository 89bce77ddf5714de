//! Feature resolution: find the plugin providing a named capability.
//!
//! Plugins never name each other's types. A consumer asks for a feature
//! ("columnWidth") on an entity; the first live plugin, in configuration
//! order, that declares the feature provides it, and the consumer gets that
//! provider's meta for the entity.

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::plugin::{AnyPlugin, EntityRef, ErasedMeta, FeatureView};
use crate::registry::{self, PluginList};
use crate::row::Row;
use crate::table::Table;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tabula_types::MetaScope;
use tracing::debug;

/// The provider of a feature and its meta for one entity.
pub struct ResolvedFeature {
    feature: String,
    provider: String,
    plugin_type: TypeId,
    scope: MetaScope,
    meta: ErasedMeta,
    view: Option<FeatureView>,
}

impl ResolvedFeature {
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Name of the providing plugin.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn plugin_type(&self) -> TypeId {
        self.plugin_type
    }

    pub fn scope(&self) -> MetaScope {
        self.scope
    }

    pub fn meta(&self) -> &ErasedMeta {
        &self.meta
    }

    /// The provider's meta as its concrete type.
    pub fn downcast<M: Any + Send + Sync>(&self) -> Option<Arc<M>> {
        Arc::clone(&self.meta).downcast::<M>().ok()
    }

    /// The capability object the provider published for this feature,
    /// typically an `Arc<dyn SomeTrait>`.
    pub fn view<V: Any + Clone>(&self) -> Option<V> {
        self.view.as_ref()?.downcast_ref::<V>().cloned()
    }
}

impl fmt::Debug for ResolvedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFeature")
            .field("feature", &self.feature)
            .field("provider", &self.provider)
            .field("scope", &self.scope)
            .field("has_view", &self.view.is_some())
            .finish()
    }
}

fn provider(plugins: &PluginList, feature: &str) -> TableResult<Arc<dyn AnyPlugin>> {
    registry::provider_of(plugins, feature).ok_or_else(|| TableError::FeatureUnavailable {
        feature: feature.to_string(),
        available: registry::available_features(plugins),
    })
}

fn resolve(table: &Table, entity: EntityRef<'_>, feature: &str) -> TableResult<ResolvedFeature> {
    let plugins = table.plugins()?;
    let plugin = provider(&plugins, feature)?;
    let scope = entity.scope();
    let meta = table.store().get_or_create(entity, &plugin)?;
    let view = plugin.feature_view(scope, feature, &meta);
    debug!(feature, provider = plugin.plugin_name(), %scope, "Feature resolved");

    Ok(ResolvedFeature {
        feature: feature.to_string(),
        provider: plugin.plugin_name().to_string(),
        plugin_type: plugin.plugin_type(),
        scope,
        meta,
        view,
    })
}

pub fn resolve_table_feature(table: &Table, feature: &str) -> TableResult<ResolvedFeature> {
    resolve(table, EntityRef::Table(table), feature)
}

pub fn resolve_column_feature(column: &Column, feature: &str) -> TableResult<ResolvedFeature> {
    let table = column.table()?;
    resolve(&table, EntityRef::Column(column), feature)
}

pub fn resolve_row_feature(row: &Row, feature: &str) -> TableResult<ResolvedFeature> {
    let table = row.table()?;
    resolve(&table, EntityRef::Row(row), feature)
}

/// Every feature the live plugins provide, in configuration order.
pub fn available_features(table: &Table) -> TableResult<Vec<String>> {
    Ok(registry::available_features(&table.plugins()?))
}
