//! Per-entity plugin metadata.
//!
//! [`MetaStore`] keeps one meta per (entity, plugin type) in three
//! independent maps:
//!
//! - **table** metas are keyed by [`TableId`], never by handle address,
//!   so every handle to a table sees the same metas. They live until the
//!   table is dropped or [`Table::teardown`] is called.
//! - **column** and **row** metas are keyed by the entity's allocation.
//!   The store holds no reference to the entity; when a column or row is
//!   dropped (because its list was replaced) its bucket is evicted on the
//!   spot, so regenerated entities never inherit or leak old state.
//!
//! Lookups are create-if-absent and never overwrite. No lock is held
//! while a plugin factory runs, so factories may ask for other metas.
//! A factory asking for its own meta is a cycle; another thread asking
//! for a meta that is being built waits for it instead.

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::plugin::{AnyPlugin, EntityRef, ErasedMeta, Plugin};
use crate::row::Row;
use crate::table::{Table, lock};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use tabula_types::{MetaScope, TableId};
use tracing::debug;

type Bucket = HashMap<TypeId, ErasedMeta>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EntityKey {
    Table(TableId),
    Column(usize),
    Row(usize),
}

impl EntityKey {
    fn scope(&self) -> MetaScope {
        match self {
            Self::Table(_) => MetaScope::Table,
            Self::Column(_) => MetaScope::Column,
            Self::Row(_) => MetaScope::Row,
        }
    }
}

impl EntityRef<'_> {
    pub(crate) fn key(&self) -> EntityKey {
        match self {
            Self::Table(table) => EntityKey::Table(table.id()),
            Self::Column(column) => column.entity_key(),
            Self::Row(row) => row.entity_key(),
        }
    }
}

/// Metadata store shared by tables.
#[derive(Default)]
pub struct MetaStore {
    tables: Mutex<HashMap<EntityKey, Bucket>>,
    columns: Mutex<HashMap<EntityKey, Bucket>>,
    rows: Mutex<HashMap<EntityKey, Bucket>>,
    /// Metas whose factory is currently running, with the building thread.
    pending: Mutex<HashMap<(EntityKey, TypeId), ThreadId>>,
    /// Signalled whenever a pending entry is cleared.
    settled: Condvar,
}

/// Clears a pending mark when the factory returns or unwinds.
struct PendingGuard<'a> {
    store: &'a MetaStore,
    key: (EntityKey, TypeId),
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(&self.store.pending).remove(&self.key);
        self.store.settled.notify_all();
    }
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store used by tables built without an explicit one.
    pub fn shared() -> Arc<MetaStore> {
        static SHARED: OnceLock<Arc<MetaStore>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(MetaStore::new())))
    }

    fn shard(&self, scope: MetaScope) -> &Mutex<HashMap<EntityKey, Bucket>> {
        match scope {
            MetaScope::Table => &self.tables,
            MetaScope::Column => &self.columns,
            MetaScope::Row => &self.rows,
        }
    }

    fn lookup(&self, key: EntityKey, plugin_type: TypeId) -> Option<ErasedMeta> {
        lock(self.shard(key.scope()))
            .get(&key)
            .and_then(|bucket| bucket.get(&plugin_type))
            .cloned()
    }

    /// Returns the meta `plugin` keeps for `entity`, creating it on first use.
    pub(crate) fn get_or_create(
        &self,
        entity: EntityRef<'_>,
        plugin: &Arc<dyn AnyPlugin>,
    ) -> TableResult<ErasedMeta> {
        let key = entity.key();
        let scope = key.scope();
        let plugin_type = plugin.plugin_type();
        if let Some(meta) = self.lookup(key, plugin_type) {
            return Ok(meta);
        }

        let _pending = self.begin(key, plugin_type, plugin.plugin_name())?;
        // The meta may have landed while this thread waited for its builder.
        if let Some(meta) = self.lookup(key, plugin_type) {
            return Ok(meta);
        }
        let meta = plugin
            .create_meta(entity)?
            .ok_or_else(|| TableError::MissingMetaFactory {
                plugin: plugin.plugin_name().to_string(),
                scope,
            })?;
        debug!(plugin = plugin.plugin_name(), %scope, "Meta created");
        self.insert(key, plugin_type, plugin.plugin_name(), meta)
    }

    /// Marks `(key, plugin_type)` as being built by the current thread.
    ///
    /// Re-entry from the building thread is an error. Other threads block
    /// until the builder finishes, then take the mark themselves.
    fn begin(&self, key: EntityKey, plugin_type: TypeId, plugin: &str) -> TableResult<PendingGuard<'_>> {
        let me = thread::current().id();
        let mut pending = lock(&self.pending);
        while let Some(&builder) = pending.get(&(key, plugin_type)) {
            if builder == me {
                return Err(match key {
                    EntityKey::Table(id) => TableError::DuplicateTableMeta {
                        table_id: id.to_string(),
                        plugin: plugin.to_string(),
                    },
                    _ => TableError::MetaCycle {
                        plugin: plugin.to_string(),
                        scope: key.scope(),
                    },
                });
            }
            pending = self
                .settled
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
        pending.insert((key, plugin_type), me);
        Ok(PendingGuard {
            store: self,
            key: (key, plugin_type),
        })
    }

    /// Stores a freshly built meta.
    ///
    /// A second table meta for the same plugin is an error. For columns
    /// and rows the first stored meta wins and is returned.
    fn insert(&self, key: EntityKey, plugin_type: TypeId, plugin: &str, meta: ErasedMeta) -> TableResult<ErasedMeta> {
        let mut shard = lock(self.shard(key.scope()));
        let bucket = shard.entry(key).or_default();
        match bucket.get(&plugin_type) {
            Some(existing) => {
                let existing = Arc::clone(existing);
                drop(shard);
                if let EntityKey::Table(id) = key {
                    return Err(TableError::DuplicateTableMeta {
                        table_id: id.to_string(),
                        plugin: plugin.to_string(),
                    });
                }
                drop(meta);
                Ok(existing)
            }
            None => {
                bucket.insert(plugin_type, Arc::clone(&meta));
                Ok(meta)
            }
        }
    }

    /// Stores a table meta built outside the normal lookup path.
    ///
    /// Fails with `DuplicateTableMeta` if plugin `P` already has one for
    /// this table; the existing meta is kept.
    pub fn insert_table_meta<P: Plugin>(&self, table: &Table, meta: P::TableMeta) -> TableResult<Arc<P::TableMeta>> {
        let meta = Arc::new(meta);
        self.insert(
            EntityKey::Table(table.id()),
            TypeId::of::<P>(),
            P::NAME,
            Arc::clone(&meta) as ErasedMeta,
        )?;
        Ok(meta)
    }

    /// Drops every table meta of `id`. Returns how many were dropped.
    pub fn forget_table(&self, id: TableId) -> usize {
        let removed = lock(&self.tables).remove(&EntityKey::Table(id));
        removed.map_or(0, |bucket| bucket.len())
    }

    pub(crate) fn evict(&self, key: EntityKey) {
        let removed = lock(self.shard(key.scope())).remove(&key);
        drop(removed);
    }

    pub fn table_meta_count(&self, id: TableId) -> usize {
        lock(&self.tables)
            .get(&EntityKey::Table(id))
            .map_or(0, HashMap::len)
    }

    /// Number of columns that currently have at least one meta.
    pub fn column_bucket_count(&self) -> usize {
        lock(&self.columns).len()
    }

    pub fn row_bucket_count(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn holds_column(&self, column: &Column) -> bool {
        lock(&self.columns).contains_key(&column.entity_key())
    }

    pub fn holds_row(&self, row: &Row) -> bool {
        lock(&self.rows).contains_key(&row.entity_key())
    }
}

impl fmt::Debug for MetaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaStore")
            .field("tables", &lock(&self.tables).len())
            .field("columns", &lock(&self.columns).len())
            .field("rows", &lock(&self.rows).len())
            .finish()
    }
}

fn typed<M: Send + Sync + 'static>(meta: ErasedMeta, plugin: &str, scope: MetaScope) -> TableResult<Arc<M>> {
    meta.downcast::<M>().map_err(|_| TableError::MetaTypeMismatch {
        plugin: plugin.to_string(),
        scope,
    })
}

/// The table meta of plugin `P`, creating it on first use.
pub fn for_table<P: Plugin>(table: &Table) -> TableResult<Arc<P::TableMeta>> {
    let plugin = table.require_plugin(TypeId::of::<P>(), P::NAME)?;
    let meta = table.store().get_or_create(EntityRef::Table(table), &plugin)?;
    typed(meta, P::NAME, MetaScope::Table)
}

/// The meta plugin `P` keeps for `column`, creating it on first use.
pub fn for_column<P: Plugin>(column: &Column) -> TableResult<Arc<P::ColumnMeta>> {
    let table = column.table()?;
    let plugin = table.require_plugin(TypeId::of::<P>(), P::NAME)?;
    let meta = table.store().get_or_create(EntityRef::Column(column), &plugin)?;
    typed(meta, P::NAME, MetaScope::Column)
}

/// The meta plugin `P` keeps for `row`, creating it on first use.
pub fn for_row<P: Plugin>(row: &Row) -> TableResult<Arc<P::RowMeta>> {
    let table = row.table()?;
    let plugin = table.require_plugin(TypeId::of::<P>(), P::NAME)?;
    let meta = table.store().get_or_create(EntityRef::Row(row), &plugin)?;
    typed(meta, P::NAME, MetaScope::Row)
}
