//! Executor nodes implementing the Volcano iterator model.
//!
//! Every node implements [`Operator`]: the parent calls `open`, then pulls
//! rows with `next` until it returns `false`, reading each row through
//! `current_tuple`, and finally calls `close`. Nodes are composed into a tree
//! (e.g., Aggregate -> Filter -> TableScan) where each parent pulls from its
//! child.
//!
//! This module holds the trait and the leaf/pass-through nodes. The
//! aggregate and update nodes live in their own modules.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::warn;

use crate::datum::Value;
use crate::heap::{Record, RecordId, Table};
use crate::tx::Transaction;

use super::error::ExecutorError;
use super::tuple::{RowTuple, Tuple, ValueListTuple};

/// A pull-based query operator.
///
/// Uses `dyn Operator` so that external row sources can be plugged in as
/// children next to the nodes defined in this crate.
pub trait Operator {
    /// Prepares the operator (and its children) for iteration.
    fn open(&mut self, trx: Arc<dyn Transaction>) -> Result<(), ExecutorError>;

    /// Advances to the next row. Returns `false` at end-of-stream.
    fn next(&mut self) -> Result<bool, ExecutorError>;

    /// Returns the row produced by the last successful `next`.
    fn current_tuple(&self) -> Option<&dyn Tuple>;

    /// Releases the operator (and its children).
    fn close(&mut self) -> Result<(), ExecutorError>;
}

/// Opens an optional child, logging failures.
pub(super) fn open_child(
    child: Option<&mut Box<dyn Operator>>,
    trx: Arc<dyn Transaction>,
) -> Result<(), ExecutorError> {
    match child {
        Some(child) => child.open(trx).inspect_err(|e| {
            warn!(error = %e, "failed to open child operator");
        }),
        None => Ok(()),
    }
}

/// Scan over a fixed list of rows.
pub struct ValuesScan {
    rows: Vec<ValueListTuple>,
    /// Index of the next row to emit; `None` until opened.
    cursor: Option<usize>,
    current: Option<usize>,
}

impl ValuesScan {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows: rows.into_iter().map(ValueListTuple::new).collect(),
            cursor: None,
            current: None,
        }
    }
}

impl Operator for ValuesScan {
    fn open(&mut self, _trx: Arc<dyn Transaction>) -> Result<(), ExecutorError> {
        self.cursor = Some(0);
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, ExecutorError> {
        let cursor = self.cursor.as_mut().ok_or(ExecutorError::NotOpen)?;
        if *cursor < self.rows.len() {
            self.current = Some(*cursor);
            *cursor += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current
            .and_then(|i| self.rows.get(i))
            .map(|t| t as &dyn Tuple)
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        self.cursor = None;
        self.current = None;
        Ok(())
    }
}

/// Sequential scan over a table heap.
///
/// `open` snapshots the table, so rows written after `open` (for example by
/// an [`UpdateNode`](super::UpdateNode) sitting above this scan) are not
/// visited.
pub struct TableScan {
    table: Arc<Table>,
    /// Buffered records from the snapshot; `None` until opened.
    rows: Option<std::vec::IntoIter<(RecordId, Record)>>,
    current: Option<RowTuple>,
}

impl TableScan {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            rows: None,
            current: None,
        }
    }
}

impl Operator for TableScan {
    fn open(&mut self, _trx: Arc<dyn Transaction>) -> Result<(), ExecutorError> {
        self.rows = Some(self.table.scan().into_iter());
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, ExecutorError> {
        let rows = self.rows.as_mut().ok_or(ExecutorError::NotOpen)?;
        self.current = rows.next().map(|(rid, record)| RowTuple::new(rid, record));
        Ok(self.current.is_some())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        self.rows = None;
        self.current = None;
        Ok(())
    }
}

/// Comparison operator of a [`FieldPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Ne => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
        }
    }
}

/// `cell[index] <op> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub index: usize,
    pub op: CompOp,
    pub value: Value,
}

impl FieldPredicate {
    pub fn new(index: usize, op: CompOp, value: impl Into<Value>) -> Self {
        Self {
            index,
            op,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a tuple.
    pub fn eval(&self, tuple: &dyn Tuple) -> Result<bool, ExecutorError> {
        let cell = tuple.cell_at(self.index)?;
        Ok(self.op.matches(cell.compare(&self.value)?))
    }
}

/// Passes through the child rows that satisfy a predicate.
pub struct Filter {
    child: Box<dyn Operator>,
    predicate: FieldPredicate,
}

impl Filter {
    pub fn new(child: Box<dyn Operator>, predicate: FieldPredicate) -> Self {
        Self { child, predicate }
    }
}

impl Operator for Filter {
    fn open(&mut self, trx: Arc<dyn Transaction>) -> Result<(), ExecutorError> {
        self.child.open(trx)
    }

    fn next(&mut self) -> Result<bool, ExecutorError> {
        while self.child.next()? {
            let tuple = self
                .child
                .current_tuple()
                .ok_or(ExecutorError::NoCurrentTuple)?;
            if self.predicate.eval(tuple)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.child.current_tuple()
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        self.child.close()
    }
}
