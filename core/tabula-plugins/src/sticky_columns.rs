//! Columns pinned to the left or right edge of a scrolling table.
//!
//! A sticky column's offset is the summed width of the visible columns
//! between it and its edge. Visibility comes from the table's
//! `columnVisibility` provider and each width from that column's
//! `columnWidth` provider; a column whose width cannot be resolved adds
//! nothing rather than failing the whole offset.

use crate::features::{self, COLUMN_VISIBILITY, COLUMN_WIDTH};
use serde::Deserialize;
use std::fmt;
use tabula_engine::{
    Column, Memo, Plugin, PluginClass, PluginContext, Revision, Table, TableError, TableResult,
    WeakColumn, options,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickySide {
    Left,
    Right,
}

impl fmt::Display for StickySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StickyOptions {
    pub sticky: Option<StickySide>,
}

#[derive(Debug, Default)]
pub struct StickyColumns;

impl Plugin for StickyColumns {
    const NAME: &'static str = "sticky-columns";
    const REQUIRES: &'static [&'static str] = &[COLUMN_WIDTH, COLUMN_VISIBILITY];

    type TableMeta = ();
    type ColumnMeta = StickyColumn;
    type RowMeta = ();

    fn column_meta(&self, column: &Column) -> TableResult<Option<StickyColumn>> {
        let table = column.table()?;
        Ok(Some(StickyColumn {
            column: column.downgrade(),
            revision: table.revision().clone(),
            offset: Memo::new(),
        }))
    }
}

impl PluginClass for StickyColumns {
    fn construct(_ctx: &PluginContext<'_>) -> TableResult<Self> {
        Ok(StickyColumns)
    }
}

#[derive(Debug)]
pub struct StickyColumn {
    column: WeakColumn,
    revision: Revision,
    offset: Memo<Option<String>>,
}

impl StickyColumn {
    fn column(&self) -> TableResult<Column> {
        self.column.upgrade().ok_or(TableError::TableDropped)
    }

    /// The edge this column sticks to, read from its current options.
    pub fn position(&self) -> TableResult<Option<StickySide>> {
        let options: StickyOptions = options::column_options::<StickyColumns, _>(&self.column()?)?;
        Ok(options.sticky)
    }

    pub fn is_sticky(&self) -> TableResult<bool> {
        Ok(self.position()?.is_some())
    }

    /// CSS offset from the column's edge, e.g. `"50px"`. `None` when the
    /// column is not sticky.
    pub fn offset(&self) -> TableResult<Option<String>> {
        self.offset
            .get_or_try_compute::<TableError>(self.revision.get(), || self.compute_offset())
    }

    fn compute_offset(&self) -> TableResult<Option<String>> {
        let Some(side) = self.position()? else {
            return Ok(None);
        };
        let column = self.column()?;
        let table = column.table()?;
        let neighbours = neighbours(&table, &column, side)?;

        let total: f64 = neighbours.iter().map(width_or_zero).sum();
        debug!(column = %column.key(), %side, total, "Sticky offset computed");
        Ok(Some(format!("{total}px")))
    }
}

/// Visible columns between `column` and its sticky edge.
fn neighbours(table: &Table, column: &Column, side: StickySide) -> TableResult<Vec<Column>> {
    let index = features::visibility_index(table)?;
    match side {
        StickySide::Left => index.visible_before(table, column),
        StickySide::Right => index.visible_after(table, column),
    }
}

fn width_or_zero(column: &Column) -> f64 {
    match features::column_width(column) {
        Ok(Some(width)) => width,
        Ok(None) => 0.0,
        Err(err) => {
            debug!(column = %column.key(), error = %err, "No width for column, counting it as zero");
            0.0
        }
    }
}
