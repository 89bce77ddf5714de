use crate::config::{ColumnConfig, PluginOptions};
use crate::error::{TableError, TableResult};
use crate::meta::{EntityKey, MetaStore};
use crate::row::Row;
use crate::table::{Table, TableInner};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tabula_types::{ColumnKey, TableId};

pub(crate) struct ColumnInner {
    table: Weak<TableInner>,
    table_id: TableId,
    index: usize,
    config: ColumnConfig,
    store: Arc<MetaStore>,
}

impl Drop for ColumnInner {
    fn drop(&mut self) {
        self.store.evict(EntityKey::Column(self as *const Self as usize));
    }
}

/// One column of a table.
///
/// A column's identity is its allocation: clones are the same column,
/// while a column rebuilt from an identical definition is a different
/// one with its own metas.
#[derive(Clone)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

impl Column {
    pub(crate) fn new(table: Weak<TableInner>, owner: &Table, index: usize, config: ColumnConfig) -> Self {
        Self {
            inner: Arc::new(ColumnInner {
                table,
                table_id: owner.id(),
                index,
                config,
                store: Arc::clone(owner.store()),
            }),
        }
    }

    pub fn key(&self) -> &ColumnKey {
        &self.inner.config.key
    }

    pub fn name(&self) -> &str {
        self.inner.config.display_name()
    }

    /// Position in the column definitions this column was built from.
    pub fn index(&self) -> usize {
        self.inner.index
    }

    pub fn config(&self) -> &ColumnConfig {
        &self.inner.config
    }

    pub fn table_id(&self) -> TableId {
        self.inner.table_id
    }

    pub fn table(&self) -> TableResult<Table> {
        self.inner
            .table
            .upgrade()
            .map(|inner| Table { inner })
            .ok_or(TableError::TableDropped)
    }

    /// This column's value in `row`.
    pub fn value<'r>(&self, row: &'r Row) -> Option<&'r Value> {
        row.data().get(self.key().as_str())
    }

    pub fn downgrade(&self) -> WeakColumn {
        WeakColumn(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Column) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn plugin_options(&self) -> &[PluginOptions] {
        &self.inner.config.plugins
    }

    pub(crate) fn entity_key(&self) -> EntityKey {
        EntityKey::Column(Arc::as_ptr(&self.inner) as usize)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Column {}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", self.key())
            .field("index", &self.inner.index)
            .field("table_id", &self.inner.table_id)
            .finish()
    }
}

/// Non-owning reference to a [`Column`], for metas that need to find
/// their column again without keeping it alive.
#[derive(Clone, Default)]
pub struct WeakColumn(Weak<ColumnInner>);

impl WeakColumn {
    pub fn upgrade(&self) -> Option<Column> {
        self.0.upgrade().map(|inner| Column { inner })
    }
}

impl fmt::Debug for WeakColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakColumn")
    }
}
