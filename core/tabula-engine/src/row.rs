use crate::error::{TableError, TableResult};
use crate::meta::{EntityKey, MetaStore};
use crate::table::{Table, TableInner};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tabula_types::TableId;

pub(crate) struct RowInner {
    table: Weak<TableInner>,
    table_id: TableId,
    index: usize,
    source: Arc<[Value]>,
    store: Arc<MetaStore>,
}

impl Drop for RowInner {
    fn drop(&mut self) {
        self.store.evict(EntityKey::Row(self as *const Self as usize));
    }
}

/// One data record of a table. Identity semantics match [`Column`](crate::Column).
#[derive(Clone)]
pub struct Row {
    inner: Arc<RowInner>,
}

impl Row {
    pub(crate) fn new(table: Weak<TableInner>, owner: &Table, index: usize, source: Arc<[Value]>) -> Self {
        Self {
            inner: Arc::new(RowInner {
                table,
                table_id: owner.id(),
                index,
                source,
                store: Arc::clone(owner.store()),
            }),
        }
    }

    pub fn index(&self) -> usize {
        self.inner.index
    }

    pub fn data(&self) -> &Value {
        &self.inner.source[self.inner.index]
    }

    /// Extract a string value from the record using a JSON pointer (e.g., "/name").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data().pointer(pointer).and_then(|v| v.as_str())
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

    pub fn ptr_eq(&self, other: &Row) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn entity_key(&self) -> EntityKey {
        EntityKey::Row(Arc::as_ptr(&self.inner) as usize)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Row {}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("index", &self.inner.index)
            .field("table_id", &self.inner.table_id)
            .field("data", self.data())
            .finish()
    }
}
