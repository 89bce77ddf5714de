#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};
use tabula_engine::{
    Column, ColumnConfig, FeatureView, MetaStore, Owner, Plugin, PluginClass, PluginContext,
    PluginEntry, Row, Table, TableConfig, TableError, TableResult, WeakColumn, meta,
};

// ── Metas ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Counter {
    pub hits: AtomicUsize,
}

impl Counter {
    pub fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug)]
pub struct ColumnTag {
    pub key: String,
    pub column: WeakColumn,
}

#[derive(Debug)]
pub struct RowTag {
    pub index: usize,
}

pub trait Width: Send + Sync {
    fn width(&self) -> f64;
}

#[derive(Debug)]
pub struct FixedWidth(pub f64);

impl Width for FixedWidth {
    fn width(&self) -> f64 {
        self.0
    }
}

// ── Plugins ─────────────────────────────────────────────────────

/// Keeps a meta at every scope and provides "count".
#[derive(Debug, Default)]
pub struct Tracker;

impl Plugin for Tracker {
    const NAME: &'static str = "tracker";
    const FEATURES: &'static [&'static str] = &["count"];

    type TableMeta = Counter;
    type ColumnMeta = ColumnTag;
    type RowMeta = RowTag;

    fn table_meta(&self, _table: &Table) -> TableResult<Option<Counter>> {
        Ok(Some(Counter::default()))
    }

    fn column_meta(&self, column: &Column) -> TableResult<Option<ColumnTag>> {
        Ok(Some(ColumnTag {
            key: column.key().to_string(),
            column: column.downgrade(),
        }))
    }

    fn row_meta(&self, row: &Row) -> TableResult<Option<RowTag>> {
        Ok(Some(RowTag { index: row.index() }))
    }
}

impl PluginClass for Tracker {
    fn construct(_ctx: &PluginContext<'_>) -> TableResult<Self> {
        Ok(Tracker)
    }
}

/// Provides "columnWidth" with a fixed width per instance.
pub struct WidthA;
pub struct WidthB;

macro_rules! width_plugin {
    ($ty:ident, $name:literal, $width:expr) => {
        impl Plugin for $ty {
            const NAME: &'static str = $name;
            const FEATURES: &'static [&'static str] = &["columnWidth"];

            type TableMeta = ();
            type ColumnMeta = FixedWidth;
            type RowMeta = ();

            fn column_meta(&self, _column: &Column) -> TableResult<Option<FixedWidth>> {
                Ok(Some(FixedWidth($width)))
            }

            fn column_feature(&self, feature: &str, meta: Arc<FixedWidth>) -> Option<FeatureView> {
                (feature == "columnWidth").then(|| Box::new(meta as Arc<dyn Width>) as FeatureView)
            }
        }

        impl PluginClass for $ty {
            fn construct(_ctx: &PluginContext<'_>) -> TableResult<Self> {
                Ok($ty)
            }
        }
    };
}

width_plugin!(WidthA, "width-a", 10.0);
width_plugin!(WidthB, "width-b", 20.0);

/// Declares no factories at all.
pub struct Bare;

impl Plugin for Bare {
    const NAME: &'static str = "bare";

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();
}

/// Asks for its own meta while building it.
#[derive(Default)]
pub struct Reentrant {
    pub seen: Mutex<Vec<String>>,
}

impl Plugin for Reentrant {
    const NAME: &'static str = "reentrant";

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();

    fn table_meta(&self, table: &Table) -> TableResult<Option<()>> {
        if let Err(err) = meta::for_table::<Reentrant>(table) {
            self.record(err);
        }
        Ok(Some(()))
    }

    fn column_meta(&self, column: &Column) -> TableResult<Option<()>> {
        if let Err(err) = meta::for_column::<Reentrant>(column) {
            self.record(err);
        }
        Ok(Some(()))
    }
}

impl Reentrant {
    fn record(&self, err: TableError) {
        let label = match err {
            TableError::DuplicateTableMeta { .. } => "duplicate-table-meta",
            TableError::MetaCycle { .. } => "meta-cycle",
            _ => "other",
        };
        self.seen.lock().unwrap().push(label.to_string());
    }
}

/// Takes a while to build its table and column metas, counting builds.
#[derive(Default)]
pub struct Slow {
    pub builds: AtomicUsize,
}

impl Slow {
    fn build(&self) -> Counter {
        thread::sleep(Duration::from_millis(200));
        self.builds.fetch_add(1, Ordering::SeqCst);
        Counter::default()
    }
}

impl Plugin for Slow {
    const NAME: &'static str = "slow";

    type TableMeta = Counter;
    type ColumnMeta = Counter;
    type RowMeta = ();

    fn table_meta(&self, _table: &Table) -> TableResult<Option<Counter>> {
        Ok(Some(self.build()))
    }

    fn column_meta(&self, _column: &Column) -> TableResult<Option<Counter>> {
        Ok(Some(self.build()))
    }
}

/// Column factory that fails while looking up a service.
pub struct Failing;

impl Plugin for Failing {
    const NAME: &'static str = "failing";

    type TableMeta = ();
    type ColumnMeta = ();
    type RowMeta = ();

    fn column_meta(&self, _column: &Column) -> TableResult<Option<()>> {
        Err(TableError::MissingService {
            plugin: Self::NAME.to_string(),
            service: "Clock".to_string(),
        })
    }
}

// ── Builders ────────────────────────────────────────────────────

pub fn columns(keys: &[&str]) -> Vec<ColumnConfig> {
    keys.iter().map(|key| ColumnConfig::new(*key).unwrap()).collect()
}

pub fn records() -> Vec<Value> {
    vec![
        json!({ "name": "Ada", "age": 36 }),
        json!({ "name": "Grace", "age": 45 }),
    ]
}

pub fn table_with(plugins: Vec<PluginEntry>) -> Table {
    Table::builder(
        TableConfig::new()
            .data(records())
            .columns(columns(&["name", "age"]))
            .plugins(plugins),
    )
    .owner(Owner::new())
    .store(Arc::new(MetaStore::new()))
    .build()
    .unwrap()
}
