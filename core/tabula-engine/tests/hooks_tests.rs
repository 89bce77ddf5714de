mod common;

use std::any::Any;
use std::sync::{Arc, Mutex};

use common::*;
use pretty_assertions::assert_eq;
use tabula_engine::{ColumnContext, Destructor, Plugin, PluginEntry, RowContext, Table};

type Log = Arc<Mutex<Vec<String>>>;

/// Stand-in for a renderer's element type.
struct Element(&'static str);

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn undo(&self, entry: String) -> Destructor {
        let log = Arc::clone(&self.log);
        Box::new(move || log.lock().unwrap().push(entry))
    }
}

macro_rules! recorder_plugin {
    ($ty:ident, $name:literal) => {
        struct $ty(Recorder);

        impl $ty {
            fn new(log: &Log) -> Self {
                $ty(Recorder {
                    name: $name,
                    log: Arc::clone(log),
                })
            }
        }

        impl Plugin for $ty {
            const NAME: &'static str = $name;

            type TableMeta = ();
            type ColumnMeta = ();
            type RowMeta = ();

            fn header_cell_hook(&self, element: &dyn Any, ctx: &ColumnContext<'_>) -> Option<Destructor> {
                let element = element.downcast_ref::<Element>()?;
                self.0.push(format!("{}:header:{}:{}", self.0.name, element.0, ctx.column.key()));
                Some(self.0.undo(format!("{}:undo-header", self.0.name)))
            }

            fn row_hook(&self, _element: &dyn Any, ctx: &RowContext<'_>) -> Option<Destructor> {
                self.0.push(format!("{}:row:{}", self.0.name, ctx.row.index()));
                None
            }

            fn container_hook(&self, _element: &dyn Any, table: &Table) -> Option<Destructor> {
                self.0.push(format!("{}:container:{}", self.0.name, table.columns().len()));
                Some(self.0.undo(format!("{}:undo-container", self.0.name)))
            }
        }
    };
}

recorder_plugin!(First, "first");
recorder_plugin!(Second, "second");

fn recorded_table(log: &Log) -> Table {
    table_with(vec![
        PluginEntry::instance(First::new(log)),
        PluginEntry::instance(Second::new(log)),
    ])
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ── Attachment ──────────────────────────────────────────────────

#[test]
fn hooks_run_in_plugin_order_and_undo_in_reverse() {
    let log = Log::default();
    let table = recorded_table(&log);
    let column = table.column("name").unwrap();

    let cleanup = table.attach_header_cell(&Element("th"), &column).unwrap();
    assert_eq!(cleanup.len(), 2);
    assert_eq!(
        entries(&log),
        vec!["first:header:th:name".to_string(), "second:header:th:name".to_string()]
    );

    cleanup.run();
    assert_eq!(
        entries(&log)[2..].to_vec(),
        vec!["second:undo-header".to_string(), "first:undo-header".to_string()]
    );
}

#[test]
fn dropping_cleanup_detaches() {
    let log = Log::default();
    let table = recorded_table(&log);

    {
        let _cleanup = table.attach_container(&Element("div")).unwrap();
    }
    assert_eq!(
        entries(&log),
        vec![
            "first:container:2".to_string(),
            "second:container:2".to_string(),
            "second:undo-container".to_string(),
            "first:undo-container".to_string(),
        ]
    );
}

#[test]
fn hooks_without_destructor_leave_cleanup_empty() {
    let log = Log::default();
    let table = recorded_table(&log);
    let rows = table.rows();

    let cleanup = table.attach_row(&Element("tr"), &rows[1]).unwrap();
    assert!(cleanup.is_empty());
    assert_eq!(entries(&log), vec!["first:row:1".to_string(), "second:row:1".to_string()]);
}

#[test]
fn unknown_elements_are_ignored() {
    let log = Log::default();
    let table = recorded_table(&log);
    let column = table.column("age").unwrap();

    let cleanup = table.attach_header_cell(&42u32, &column).unwrap();
    assert!(cleanup.is_empty());
    assert!(entries(&log).is_empty());
}
