//! Column widths.
//!
//! A column's width is, in order of precedence: the `width` preference a
//! user set by resizing, the column's `width` option, the table's
//! `default_width` option. Resizing clamps to `min_width` and persists.

use crate::features::{COLUMN_WIDTH, ColumnWidth};
use serde::Deserialize;
use std::sync::Arc;
use tabula_engine::{
    Column, FeatureView, Plugin, PluginClass, PluginContext, Revision, ScopedPreferences,
    TableError, TableResult, WeakColumn, options, preferences,
};
use tracing::debug;

const WIDTH: &str = "width";

pub const DEFAULT_WIDTH: f64 = 128.0;
pub const DEFAULT_MIN_WIDTH: f64 = 32.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResizingOptions {
    pub default_width: f64,
    pub min_width: f64,
}

impl Default for ResizingOptions {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            min_width: DEFAULT_MIN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnResizingOptions {
    pub width: Option<f64>,
    /// Overrides the table's `min_width` for this column.
    pub min_width: Option<f64>,
}

/// Provides `columnWidth`.
#[derive(Debug, Default)]
pub struct ColumnResizing;

impl Plugin for ColumnResizing {
    const NAME: &'static str = "column-resizing";
    const FEATURES: &'static [&'static str] = &[COLUMN_WIDTH];

    type TableMeta = ();
    type ColumnMeta = ColumnSize;
    type RowMeta = ();

    fn column_meta(&self, column: &Column) -> TableResult<Option<ColumnSize>> {
        let table = column.table()?;
        Ok(Some(ColumnSize {
            column: column.downgrade(),
            preferences: preferences::for_column::<Self>(column)?,
            revision: table.revision().clone(),
        }))
    }

    fn column_feature(&self, feature: &str, meta: Arc<ColumnSize>) -> Option<FeatureView> {
        (feature == COLUMN_WIDTH).then(|| Box::new(meta as Arc<dyn ColumnWidth>) as FeatureView)
    }
}

impl PluginClass for ColumnResizing {
    fn construct(ctx: &PluginContext<'_>) -> TableResult<Self> {
        debug!(table_id = %ctx.table_id, "Column resizing enabled");
        Ok(ColumnResizing)
    }
}

/// Width state of one column.
#[derive(Debug)]
pub struct ColumnSize {
    column: WeakColumn,
    preferences: ScopedPreferences,
    revision: Revision,
}

impl ColumnSize {
    fn column(&self) -> TableResult<Column> {
        self.column.upgrade().ok_or(TableError::TableDropped)
    }

    fn limits(&self) -> TableResult<(ResizingOptions, ColumnResizingOptions)> {
        let column = self.column()?;
        let table = column.table()?;
        Ok((
            options::table_options::<ColumnResizing, _>(&table)?,
            options::column_options::<ColumnResizing, _>(&column)?,
        ))
    }

    pub fn width(&self) -> TableResult<f64> {
        if let Some(width) = self.preferences.get_as::<f64>(WIDTH) {
            return Ok(width);
        }
        let (table, column) = self.limits()?;
        Ok(column.width.unwrap_or(table.default_width))
    }

    pub fn min_width(&self) -> TableResult<f64> {
        let (table, column) = self.limits()?;
        Ok(column.min_width.unwrap_or(table.min_width))
    }

    /// Resizes the column, clamped to its minimum. Returns the stored width.
    pub fn set_width(&self, width: f64) -> TableResult<f64> {
        let width = width.max(self.min_width()?);
        let persisted = self.preferences.set(WIDTH, width);
        let revision = self.revision.bump();
        debug!(column = %self.preferences.scope(), width, revision, "Column resized");
        persisted?;
        Ok(width)
    }

    /// Forgets the user's width, falling back to the configured one.
    pub fn reset(&self) -> TableResult<()> {
        let persisted = self.preferences.delete(WIDTH);
        self.revision.bump();
        persisted?;
        Ok(())
    }
}

impl ColumnWidth for ColumnSize {
    fn width(&self) -> TableResult<f64> {
        ColumnSize::width(self)
    }
}
