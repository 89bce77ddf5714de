//! Feature names and the views published under them.

use std::sync::Arc;
use tabula_engine::{Column, Table, TableError, TableResult, resolve_column_feature, resolve_table_feature};

/// Column-scoped. Published as `Arc<dyn ColumnWidth>`.
pub const COLUMN_WIDTH: &str = "columnWidth";

/// Table-scoped. Published as `Arc<dyn VisibilityIndex>`.
pub const COLUMN_VISIBILITY: &str = "columnVisibility";

/// Width of one column, in pixels.
pub trait ColumnWidth: Send + Sync {
    fn width(&self) -> TableResult<f64>;
}

/// Which columns of a table are currently visible.
pub trait VisibilityIndex: Send + Sync {
    /// Visible columns in column order.
    fn visible_columns(&self, table: &Table) -> TableResult<Vec<Column>>;

    /// Visible columns positioned before `column`.
    fn visible_before(&self, table: &Table, column: &Column) -> TableResult<Vec<Column>> {
        Ok(self
            .visible_columns(table)?
            .into_iter()
            .filter(|c| c.index() < column.index())
            .collect())
    }

    /// Visible columns positioned after `column`.
    fn visible_after(&self, table: &Table, column: &Column) -> TableResult<Vec<Column>> {
        Ok(self
            .visible_columns(table)?
            .into_iter()
            .filter(|c| c.index() > column.index())
            .collect())
    }
}

/// Width of `column` from whichever plugin provides `columnWidth`.
/// `None` when the provider publishes no width view.
pub fn column_width(column: &Column) -> TableResult<Option<f64>> {
    let resolved = resolve_column_feature(column, COLUMN_WIDTH)?;
    resolved
        .view::<Arc<dyn ColumnWidth>>()
        .map(|view| view.width())
        .transpose()
}

/// The active `columnVisibility` view of `table`.
///
/// Fails with `MissingFeatureView` when the provider publishes no
/// [`VisibilityIndex`].
pub fn visibility_index(table: &Table) -> TableResult<Arc<dyn VisibilityIndex>> {
    let resolved = resolve_table_feature(table, COLUMN_VISIBILITY)?;
    resolved
        .view::<Arc<dyn VisibilityIndex>>()
        .ok_or_else(|| TableError::MissingFeatureView {
            feature: COLUMN_VISIBILITY.to_string(),
            provider: resolved.provider().to_string(),
        })
}
