//! Hiding and showing columns.
//!
//! Hidden state comes from the `isVisible` preference once a user has
//! toggled the column, and from the column's `is_hidden` option before.

use crate::features::{COLUMN_VISIBILITY, VisibilityIndex};
use serde::Deserialize;
use std::sync::Arc;
use tabula_engine::{
    Column, FeatureView, Memo, Plugin, PluginClass, PluginContext, Revision, ScopedPreferences,
    Table, TableError, TableResult, WeakColumn, meta, options, preferences,
};
use tracing::debug;

const IS_VISIBLE: &str = "isVisible";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    pub is_hidden: bool,
}

/// Provides `columnVisibility`.
#[derive(Debug, Default)]
pub struct ColumnVisibility;

impl Plugin for ColumnVisibility {
    const NAME: &'static str = "column-visibility";
    const FEATURES: &'static [&'static str] = &[COLUMN_VISIBILITY];

    type TableMeta = VisibleColumns;
    type ColumnMeta = ColumnVisibilityState;
    type RowMeta = ();

    fn table_meta(&self, _table: &Table) -> TableResult<Option<VisibleColumns>> {
        Ok(Some(VisibleColumns::default()))
    }

    fn column_meta(&self, column: &Column) -> TableResult<Option<ColumnVisibilityState>> {
        let table = column.table()?;
        Ok(Some(ColumnVisibilityState {
            column: column.downgrade(),
            preferences: preferences::for_column::<Self>(column)?,
            revision: table.revision().clone(),
        }))
    }

    fn table_feature(&self, feature: &str, meta: Arc<VisibleColumns>) -> Option<FeatureView> {
        (feature == COLUMN_VISIBILITY).then(|| Box::new(meta as Arc<dyn VisibilityIndex>) as FeatureView)
    }
}

impl PluginClass for ColumnVisibility {
    fn construct(_ctx: &PluginContext<'_>) -> TableResult<Self> {
        Ok(ColumnVisibility)
    }
}

/// Visibility of one column.
#[derive(Debug)]
pub struct ColumnVisibilityState {
    column: WeakColumn,
    preferences: ScopedPreferences,
    revision: Revision,
}

impl ColumnVisibilityState {
    pub fn is_hidden(&self) -> TableResult<bool> {
        if let Some(visible) = self.preferences.get_as::<bool>(IS_VISIBLE) {
            return Ok(!visible);
        }
        let column = self.column.upgrade().ok_or(TableError::TableDropped)?;
        let options: VisibilityOptions = options::column_options::<ColumnVisibility, _>(&column)?;
        Ok(options.is_hidden)
    }

    pub fn is_visible(&self) -> TableResult<bool> {
        Ok(!self.is_hidden()?)
    }

    pub fn hide(&self) -> TableResult<()> {
        self.set_visible(false)
    }

    pub fn show(&self) -> TableResult<()> {
        self.set_visible(true)
    }

    /// Flips the column and returns whether it is now visible.
    pub fn toggle(&self) -> TableResult<bool> {
        let visible = self.is_hidden()?;
        self.set_visible(visible)?;
        Ok(visible)
    }

    fn set_visible(&self, visible: bool) -> TableResult<()> {
        let persisted = self.preferences.set(IS_VISIBLE, visible);
        let revision = self.revision.bump();
        debug!(column = %self.preferences.scope(), visible, revision, "Column visibility changed");
        persisted?;
        Ok(())
    }
}

/// Table-wide index of visible columns, recomputed per table revision.
#[derive(Debug, Default)]
pub struct VisibleColumns {
    indices: Memo<Arc<[usize]>>,
}

impl VisibleColumns {
    fn indices(&self, table: &Table) -> TableResult<Arc<[usize]>> {
        self.indices.get_or_try_compute::<TableError>(table.revision().get(), || {
            let mut visible = Vec::new();
            for column in table.columns().iter() {
                if meta::for_column::<ColumnVisibility>(column)?.is_visible()? {
                    visible.push(column.index());
                }
            }
            Ok(Arc::from(visible))
        })
    }
}

impl VisibilityIndex for VisibleColumns {
    fn visible_columns(&self, table: &Table) -> TableResult<Vec<Column>> {
        let indices = self.indices(table)?;
        let columns = table.columns();
        Ok(indices.iter().filter_map(|&i| columns.get(i).cloned()).collect())
    }
}
