//! Plugin options.
//!
//! Options are read from the current configuration on every call. Nothing
//! is cached, so a provider closure that reads live application state is
//! picked up immediately.

use crate::column::Column;
use crate::error::{TableError, TableResult};
use crate::plugin::Plugin;
use crate::table::Table;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::TypeId;
use tabula_types::MetaScope;

fn normalize(value: Option<Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    }
}

/// Table-level options of plugin `P`. `{}` when none are configured.
pub fn for_table<P: Plugin>(table: &Table) -> Value {
    let provider = table.config().options_for(TypeId::of::<P>());
    normalize(provider.map(|provider| provider()))
}

/// Options plugin `P` has on `column`. `{}` when none are configured.
pub fn for_column<P: Plugin>(column: &Column) -> Value {
    let provider = column
        .plugin_options()
        .iter()
        .find(|options| options.plugin_type == TypeId::of::<P>())
        .map(|options| &options.provider);
    normalize(provider.map(|provider| provider()))
}

fn decode<O: DeserializeOwned + Default>(value: Value, plugin: &str, scope: MetaScope) -> TableResult<O> {
    if value.as_object().is_some_and(Map::is_empty) {
        return Ok(O::default());
    }
    serde_json::from_value(value).map_err(|source| TableError::InvalidOptions {
        plugin: plugin.to_string(),
        scope,
        source,
    })
}

/// Table-level options of plugin `P`, decoded into `O`.
pub fn table_options<P: Plugin, O: DeserializeOwned + Default>(table: &Table) -> TableResult<O> {
    decode(for_table::<P>(table), P::NAME, MetaScope::Table)
}

/// Column options of plugin `P`, decoded into `O`.
pub fn column_options<P: Plugin, O: DeserializeOwned + Default>(column: &Column) -> TableResult<O> {
    decode(for_column::<P>(column), P::NAME, MetaScope::Column)
}
