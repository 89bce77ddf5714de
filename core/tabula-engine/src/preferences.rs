//! Preferences scoped to a plugin and an entity.

use crate::column::Column;
use crate::error::TableResult;
use crate::plugin::Plugin;
use crate::table::Table;
use std::any::TypeId;
use std::sync::Arc;
use tabula_preferences::{PreferenceScope, ScopedPreferences};

/// Table-scoped preferences of plugin `P`.
pub fn for_table<P: Plugin>(table: &Table) -> TableResult<ScopedPreferences> {
    let plugin = table.require_plugin(TypeId::of::<P>(), P::NAME)?;
    Ok(ScopedPreferences::new(
        Arc::clone(table.preferences()),
        plugin.plugin_name(),
        PreferenceScope::Table,
    ))
}

/// Preferences plugin `P` keeps for `column`, keyed by the column key.
pub fn for_column<P: Plugin>(column: &Column) -> TableResult<ScopedPreferences> {
    let table = column.table()?;
    let plugin = table.require_plugin(TypeId::of::<P>(), P::NAME)?;
    Ok(ScopedPreferences::new(
        Arc::clone(table.preferences()),
        plugin.plugin_name(),
        PreferenceScope::Column(column.key().clone()),
    ))
}
