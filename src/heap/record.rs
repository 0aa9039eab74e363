//! Record representation.
//!
//! A [`Record`] is the data portion of a stored row: its cell values in field
//! order. A [`RecordId`] addresses a record within one table's heap.

use std::fmt;

use crate::datum::Value;

/// Position of a record within a table heap.
///
/// Ids are allocated in increasing order and never reused, so scanning a
/// heap in id order visits records in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record id from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record (row of cell values).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Cell values in field order.
    pub values: Vec<Value>,
}

impl Record {
    /// Creates a new record with the given values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the cell at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}
