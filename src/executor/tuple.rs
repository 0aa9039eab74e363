//! Tuples flowing between operators.
//!
//! [`Tuple`] is the read-only view a parent gets of its child's current row.
//! Two implementations are provided:
//! - [`ValueListTuple`]: a free-standing list of cells (computed rows,
//!   aggregate results)
//! - [`RowTuple`]: a stored [`Record`] together with its [`RecordId`], used
//!   by operators that write back to the table

use crate::datum::Value;
use crate::heap::{Record, RecordId};

use super::error::ExecutorError;

/// Read-only access to the cells of one row.
pub trait Tuple {
    /// Returns the number of cells.
    fn cell_num(&self) -> usize;

    /// Returns a copy of the cell at `index`.
    fn cell_at(&self, index: usize) -> Result<Value, ExecutorError>;

    /// Returns the id of the stored record behind this tuple, if any.
    fn record_id(&self) -> Option<RecordId> {
        None
    }
}

fn cell_of(cells: &[Value], index: usize) -> Result<Value, ExecutorError> {
    cells
        .get(index)
        .cloned()
        .ok_or(ExecutorError::ColumnIndexOutOfBounds {
            index,
            len: cells.len(),
        })
}

/// A tuple that owns its cells and has no physical location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueListTuple {
    cells: Vec<Value>,
}

impl ValueListTuple {
    /// Creates a tuple from its cells.
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    /// Replaces all cells.
    pub fn set_cells(&mut self, cells: Vec<Value>) {
        self.cells = cells;
    }

    /// Returns the cells.
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Consumes the tuple, returning its cells.
    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }
}

impl Tuple for ValueListTuple {
    fn cell_num(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value, ExecutorError> {
        cell_of(&self.cells, index)
    }
}

/// A tuple read from a table heap.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTuple {
    rid: RecordId,
    record: Record,
}

impl RowTuple {
    /// Creates a tuple for the stored record `rid`.
    pub fn new(rid: RecordId, record: Record) -> Self {
        Self { rid, record }
    }

    /// Returns the underlying record.
    pub fn record(&self) -> &Record {
        &self.record
    }
}

impl Tuple for RowTuple {
    fn cell_num(&self) -> usize {
        self.record.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value, ExecutorError> {
        cell_of(&self.record.values, index)
    }

    fn record_id(&self) -> Option<RecordId> {
        Some(self.rid)
    }
}
