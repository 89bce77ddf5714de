//! Lifecycle hooks plugins attach to rendered elements.
//!
//! The engine does not render anything. A renderer calls
//! [`Table::attach_header_cell`](crate::Table::attach_header_cell) and
//! friends with whatever element type it uses; plugins downcast the
//! element if they know how to handle it and ignore it otherwise.

use crate::{Column, Row, Table};
use std::fmt;

/// Undo action returned by a hook.
pub type Destructor = Box<dyn FnOnce() + Send>;

/// Context passed to column-level hooks.
pub struct ColumnContext<'a> {
    pub column: &'a Column,
    pub table: &'a Table,
}

/// Context passed to row-level hooks.
pub struct RowContext<'a> {
    pub row: &'a Row,
    pub table: &'a Table,
}

/// Destructors collected from one attachment.
///
/// Runs them in reverse attachment order, either explicitly through
/// [`run`](Self::run) or when dropped.
#[must_use = "dropping a Cleanup immediately detaches every hook"]
#[derive(Default)]
pub struct Cleanup {
    destructors: Vec<Destructor>,
}

impl Cleanup {
    pub(crate) fn new(destructors: Vec<Destructor>) -> Self {
        Self { destructors }
    }

    pub fn len(&self) -> usize {
        self.destructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destructors.is_empty()
    }

    pub fn run(mut self) {
        self.run_all();
    }

    fn run_all(&mut self) {
        while let Some(destructor) = self.destructors.pop() {
            destructor();
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run_all();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").field("pending", &self.destructors.len()).finish()
    }
}
