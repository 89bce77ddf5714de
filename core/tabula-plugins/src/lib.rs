//! Stock plugins for tabula tables.
//!
//! - [`ColumnResizing`] provides `columnWidth`: a width per column from
//!   preferences, column options or the table default
//! - [`ColumnVisibility`] provides `columnVisibility`: hide and show
//!   columns, and list the visible ones around a given column
//! - [`StickyColumns`] pins columns to the left or right edge. It knows
//!   neither of the plugins above, only the two features
//!
//! Consumers reach the first two through [`features`] rather than by type,
//! so either can be replaced by any plugin publishing the same views.

pub mod column_resizing;
pub mod column_visibility;
pub mod features;
pub mod sticky_columns;

pub use column_resizing::{ColumnResizing, ColumnSize};
pub use column_visibility::{ColumnVisibility, ColumnVisibilityState, VisibleColumns};
pub use features::{COLUMN_VISIBILITY, COLUMN_WIDTH, ColumnWidth, VisibilityIndex};
pub use sticky_columns::{StickyColumn, StickyColumns, StickySide};
