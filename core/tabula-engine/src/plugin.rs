//! The plugin authoring contract.
//!
//! A plugin is a type implementing [`Plugin`]. The type itself is the
//! plugin's identity (its "class"): a table holds at most one live
//! instance per plugin type, and metas, options and preferences are all
//! looked up by that type.
//!
//! Plugins that the engine constructs also implement [`PluginClass`].
//! Plugins built by the caller are registered as ready-made instances
//! with [`PluginEntry::instance`](crate::PluginEntry::instance).

use crate::error::TableResult;
use crate::hooks::{ColumnContext, Destructor, RowContext};
use crate::owner::Owner;
use crate::settings::EngineSettings;
use crate::{Column, Row, Table};
use std::any::{Any, TypeId};
use std::sync::Arc;
use tabula_types::{MetaScope, TableId};

/// A plugin meta with its concrete type erased.
pub type ErasedMeta = Arc<dyn Any + Send + Sync>;

/// A meta presented as the capability object of a feature, usually an
/// `Arc<dyn SomeFeatureTrait>` boxed as `Any`.
pub type FeatureView = Box<dyn Any + Send + Sync>;

/// Capability provider attached to a table.
///
/// Plugins hold no per-entity state themselves. State lives in the metas
/// they manufacture through the `*_meta` factories; the engine caches one
/// meta per (entity, plugin type). Metas must not hold strong [`Column`],
/// [`Row`] or [`Table`] handles: that would keep the entity alive through
/// its own cache entry. Use [`Column::downgrade`] where a back-reference
/// is needed.
pub trait Plugin: Send + Sync + 'static {
    /// Unique name, also the preferences namespace.
    const NAME: &'static str;

    /// Features this plugin provides.
    const FEATURES: &'static [&'static str] = &[];

    /// Features this plugin expects some other configured plugin to provide.
    const REQUIRES: &'static [&'static str] = &[];

    type TableMeta: Send + Sync + 'static;
    type ColumnMeta: Send + Sync + 'static;
    type RowMeta: Send + Sync + 'static;

    fn name(&self) -> &str {
        Self::NAME
    }

    /// Features of this instance. Defaults to [`Self::FEATURES`].
    fn features(&self) -> Vec<&str> {
        Self::FEATURES.to_vec()
    }

    /// Requirements of this instance. Defaults to [`Self::REQUIRES`].
    fn requires(&self) -> Vec<&str> {
        Self::REQUIRES.to_vec()
    }

    /// Builds the table meta. Return `Ok(None)` when the plugin keeps no
    /// table-level state; asking for it is then `MissingMetaFactory`.
    /// Errors are passed to the caller unchanged and nothing is cached.
    fn table_meta(&self, table: &Table) -> TableResult<Option<Self::TableMeta>> {
        let _ = table;
        Ok(None)
    }

    fn column_meta(&self, column: &Column) -> TableResult<Option<Self::ColumnMeta>> {
        let _ = column;
        Ok(None)
    }

    fn row_meta(&self, row: &Row) -> TableResult<Option<Self::RowMeta>> {
        let _ = row;
        Ok(None)
    }

    /// Presents the table meta as the capability object for `feature`.
    fn table_feature(&self, feature: &str, meta: Arc<Self::TableMeta>) -> Option<FeatureView> {
        let _ = (feature, meta);
        None
    }

    fn column_feature(&self, feature: &str, meta: Arc<Self::ColumnMeta>) -> Option<FeatureView> {
        let _ = (feature, meta);
        None
    }

    fn row_feature(&self, feature: &str, meta: Arc<Self::RowMeta>) -> Option<FeatureView> {
        let _ = (feature, meta);
        None
    }

    /// Called when a header cell element for `ctx.column` is attached.
    fn header_cell_hook(&self, element: &dyn Any, ctx: &ColumnContext<'_>) -> Option<Destructor> {
        let _ = (element, ctx);
        None
    }

    fn row_hook(&self, element: &dyn Any, ctx: &RowContext<'_>) -> Option<Destructor> {
        let _ = (element, ctx);
        None
    }

    fn container_hook(&self, element: &dyn Any, table: &Table) -> Option<Destructor> {
        let _ = (element, table);
        None
    }
}

/// What a plugin class receives when the engine constructs it.
///
/// The context stands in for the owning table during construction; the
/// table handle itself is passed to every meta factory and hook instead.
#[derive(Debug)]
pub struct PluginContext<'a> {
    pub table_id: TableId,
    pub owner: &'a Owner,
    pub settings: &'a EngineSettings,
}

/// A plugin the engine knows how to construct.
pub trait PluginClass: Plugin + Sized {
    fn construct(ctx: &PluginContext<'_>) -> TableResult<Self>;
}

/// Entity a meta is being created for.
#[derive(Clone, Copy)]
pub enum EntityRef<'a> {
    Table(&'a Table),
    Column(&'a Column),
    Row(&'a Row),
}

impl EntityRef<'_> {
    pub fn scope(&self) -> MetaScope {
        match self {
            Self::Table(_) => MetaScope::Table,
            Self::Column(_) => MetaScope::Column,
            Self::Row(_) => MetaScope::Row,
        }
    }
}

/// Object-safe view of a [`Plugin`], implemented for every plugin type.
pub trait AnyPlugin: Send + Sync {
    fn plugin_name(&self) -> &str;
    fn plugin_type(&self) -> TypeId;
    fn declared_features(&self) -> Vec<&str>;
    fn declared_requires(&self) -> Vec<&str>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn create_meta(&self, entity: EntityRef<'_>) -> TableResult<Option<ErasedMeta>>;
    fn feature_view(&self, scope: MetaScope, feature: &str, meta: &ErasedMeta) -> Option<FeatureView>;
    fn run_header_cell_hook(&self, element: &dyn Any, ctx: &ColumnContext<'_>) -> Option<Destructor>;
    fn run_row_hook(&self, element: &dyn Any, ctx: &RowContext<'_>) -> Option<Destructor>;
    fn run_container_hook(&self, element: &dyn Any, table: &Table) -> Option<Destructor>;
}

impl<P: Plugin> AnyPlugin for P {
    fn plugin_name(&self) -> &str {
        Plugin::name(self)
    }

    fn plugin_type(&self) -> TypeId {
        TypeId::of::<P>()
    }

    fn declared_features(&self) -> Vec<&str> {
        Plugin::features(self)
    }

    fn declared_requires(&self) -> Vec<&str> {
        Plugin::requires(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn create_meta(&self, entity: EntityRef<'_>) -> TableResult<Option<ErasedMeta>> {
        Ok(match entity {
            EntityRef::Table(table) => self.table_meta(table)?.map(|m| Arc::new(m) as ErasedMeta),
            EntityRef::Column(column) => self.column_meta(column)?.map(|m| Arc::new(m) as ErasedMeta),
            EntityRef::Row(row) => self.row_meta(row)?.map(|m| Arc::new(m) as ErasedMeta),
        })
    }

    fn feature_view(&self, scope: MetaScope, feature: &str, meta: &ErasedMeta) -> Option<FeatureView> {
        let meta = Arc::clone(meta);
        match scope {
            MetaScope::Table => self.table_feature(feature, meta.downcast().ok()?),
            MetaScope::Column => self.column_feature(feature, meta.downcast().ok()?),
            MetaScope::Row => self.row_feature(feature, meta.downcast().ok()?),
        }
    }

    fn run_header_cell_hook(&self, element: &dyn Any, ctx: &ColumnContext<'_>) -> Option<Destructor> {
        self.header_cell_hook(element, ctx)
    }

    fn run_row_hook(&self, element: &dyn Any, ctx: &RowContext<'_>) -> Option<Destructor> {
        self.row_hook(element, ctx)
    }

    fn run_container_hook(&self, element: &dyn Any, table: &Table) -> Option<Destructor> {
        self.container_hook(element, table)
    }
}
