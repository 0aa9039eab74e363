//! DML operators.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::datum::Value;
use crate::heap::{RecordId, Table};
use crate::tx::Transaction;

use super::error::ExecutorError;
use super::node::{Operator, open_child};
use super::tuple::Tuple;

/// Sets one field of every row produced by its child to a literal.
///
/// UPDATE is implemented as DELETE + INSERT:
/// 1. Build the new record from the child tuple, replacing the target cell
/// 2. Delete the old record through the transaction
/// 3. Insert the new record through the transaction
///
/// The child must yield tuples that carry a [`RecordId`] (e.g.
/// [`TableScan`](super::TableScan), possibly under a
/// [`Filter`](super::Filter)). The rewritten record gets a new id.
pub struct UpdateNode {
    table: Arc<Table>,
    field_name: String,
    value: Value,
    child: Option<Box<dyn Operator>>,
    trx: Option<Arc<dyn Transaction>>,
    target: Option<usize>,
    updated_rows: u64,
    /// Set when a drain fails; cleared by `open`.
    failed: bool,
}

impl UpdateNode {
    pub fn new(table: Arc<Table>, field_name: impl Into<String>, value: Value) -> Self {
        Self {
            table,
            field_name: field_name.into(),
            value,
            child: None,
            trx: None,
            target: None,
            updated_rows: 0,
            failed: false,
        }
    }

    /// Attaches the child operator.
    pub fn with_child(mut self, child: Box<dyn Operator>) -> Self {
        self.child = Some(child);
        self
    }

    /// Number of rows rewritten since the last `open`.
    pub fn updated_rows(&self) -> u64 {
        self.updated_rows
    }

    fn rewrite(
        &self,
        trx: &dyn Transaction,
        target: usize,
        tuple: &dyn Tuple,
    ) -> Result<RecordId, ExecutorError> {
        let rid = tuple.record_id().ok_or(ExecutorError::NotARowTuple)?;
        let values = (0..tuple.cell_num())
            .map(|i| {
                if i == target {
                    Ok(self.value.clone())
                } else {
                    tuple.cell_at(i)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let record = self.table.make_record(values).inspect_err(|e| {
            warn!(table = self.table.name(), %rid, error = %e, "failed to build updated record");
        })?;
        trx.delete_record(&self.table, rid).inspect_err(|e| {
            warn!(table = self.table.name(), %rid, error = %e, "failed to delete record");
        })?;
        let new_rid = trx.insert_record(&self.table, record).inspect_err(|e| {
            warn!(table = self.table.name(), %rid, error = %e, "failed to insert record");
        })?;
        trace!(table = self.table.name(), old = %rid, new = %new_rid, "rewrote record");
        Ok(new_rid)
    }

    fn drain(
        &mut self,
        child: &mut dyn Operator,
        trx: &dyn Transaction,
        target: usize,
    ) -> Result<(), ExecutorError> {
        while child.next()? {
            let tuple = child.current_tuple().ok_or(ExecutorError::NoCurrentTuple)?;
            self.rewrite(trx, target, tuple)?;
            self.updated_rows += 1;
        }
        Ok(())
    }
}

impl Operator for UpdateNode {
    /// Resolves the target field and opens the child.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::FieldNotFound`] if the table has no field
    /// with the configured name.
    fn open(&mut self, trx: Arc<dyn Transaction>) -> Result<(), ExecutorError> {
        let meta = self.table.table_meta();
        let target = meta
            .field_index(&self.field_name)
            .ok_or_else(|| ExecutorError::FieldNotFound {
                table: meta.name.clone(),
                field: self.field_name.clone(),
            })?;
        open_child(self.child.as_mut(), trx.clone())?;
        self.target = Some(target);
        self.trx = Some(trx);
        self.updated_rows = 0;
        self.failed = false;
        Ok(())
    }

    /// Rewrites every child row, then returns `false`.
    ///
    /// The whole child is drained inside this call and stops at the first
    /// failure. Rows rewritten before the failure stay rewritten, and every
    /// later call fails with [`ExecutorError::Aborted`] until the node is
    /// reopened.
    fn next(&mut self) -> Result<bool, ExecutorError> {
        let (Some(trx), Some(target)) = (self.trx.clone(), self.target) else {
            return Err(ExecutorError::NotOpen);
        };
        if self.failed {
            return Err(ExecutorError::Aborted);
        }
        let Some(mut child) = self.child.take() else {
            return Ok(false);
        };
        let result = self.drain(child.as_mut(), trx.as_ref(), target);
        self.child = Some(child);
        if let Err(e) = result {
            self.failed = true;
            return Err(e);
        }
        debug!(table = self.table.name(), rows = self.updated_rows, "update drained child");
        Ok(false)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        self.trx = None;
        self.target = None;
        match self.child.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::AttrType;
    use crate::executor::{CompOp, FieldPredicate, Filter, TableScan, ValuesScan};
    use crate::heap::{HeapError, Record, TableMeta};
    use crate::tx::{AutoCommitTransaction, TxError, TxId, TxOperation};

    fn table() -> Arc<Table> {
        Arc::new(Table::new(TableMeta::new(
            "items",
            [
                ("id", AttrType::Ints, 4),
                ("name", AttrType::Chars, 8),
                ("price", AttrType::Floats, 4),
            ],
        )))
    }

    fn row(id: i32, name: &str, price: f32) -> Record {
        Record::new(vec![Value::Ints(id), Value::from(name), Value::Floats(price)])
    }

    #[test]
    fn test_update_single_row() {
        let table = table();
        let rid = table.insert(row(1, "old", 3.5));
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));

        let mut update = UpdateNode::new(table.clone(), "name", Value::from("new"))
            .with_child(Box::new(TableScan::new(table.clone())));
        update.open(tx.clone()).unwrap();
        assert!(!update.next().unwrap());
        update.close().unwrap();

        assert_eq!(update.updated_rows(), 1);
        let rows = table.scan();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, row(1, "new", 3.5));

        let ops = tx.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            TxOperation::Delete {
                table: "items".into(),
                rid
            }
        );
        assert!(matches!(ops[1], TxOperation::Insert { .. }));
    }

    #[test]
    fn test_update_filtered_rows() {
        let table = table();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            table.insert(row(id, name, 1.0));
        }
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let scan = TableScan::new(table.clone());
        let filter = Filter::new(Box::new(scan), FieldPredicate::new(0, CompOp::Gt, 1));
        let mut update =
            UpdateNode::new(table.clone(), "price", Value::Floats(9.0)).with_child(Box::new(filter));
        update.open(tx).unwrap();
        assert!(!update.next().unwrap());
        assert_eq!(update.updated_rows(), 2);

        let mut prices: Vec<_> = table
            .scan()
            .into_iter()
            .map(|(_, r)| (r.values[0].clone(), r.values[2].clone()))
            .collect();
        prices.sort_by_key(|(id, _)| id.as_int());
        assert_eq!(
            prices,
            vec![
                (Value::Ints(1), Value::Floats(1.0)),
                (Value::Ints(2), Value::Floats(9.0)),
                (Value::Ints(3), Value::Floats(9.0)),
            ]
        );
    }

    #[test]
    fn test_unknown_field_fails_open() {
        let table = table();
        table.insert(row(1, "a", 1.0));
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let mut update = UpdateNode::new(table.clone(), "missing", Value::Ints(0))
            .with_child(Box::new(TableScan::new(table.clone())));
        assert_eq!(
            update.open(tx.clone()),
            Err(ExecutorError::FieldNotFound {
                table: "items".into(),
                field: "missing".into(),
            })
        );
        assert_eq!(update.next(), Err(ExecutorError::NotOpen));
        assert!(tx.operations().is_empty());
    }

    #[test]
    fn test_type_mismatch_leaves_row() {
        let table = table();
        table.insert(row(1, "a", 1.0));
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let mut update = UpdateNode::new(table.clone(), "id", Value::from("x"))
            .with_child(Box::new(TableScan::new(table.clone())));
        update.open(tx.clone()).unwrap();
        assert!(matches!(
            update.next(),
            Err(ExecutorError::Heap(HeapError::FieldTypeMismatch { .. }))
        ));
        assert_eq!(table.len(), 1);
        assert!(tx.operations().is_empty());
    }

    #[test]
    fn test_child_without_record_ids() {
        let table = table();
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let scan = ValuesScan::new(vec![vec![Value::Ints(1), Value::from("a"), Value::Floats(1.0)]]);
        let mut update =
            UpdateNode::new(table, "name", Value::from("b")).with_child(Box::new(scan));
        update.open(tx).unwrap();
        assert_eq!(update.next(), Err(ExecutorError::NotARowTuple));
    }

    #[test]
    fn test_read_only_transaction() {
        let table = table();
        table.insert(row(1, "a", 1.0));
        let tx = Arc::new(AutoCommitTransaction::read_only(TxId::new(4)));
        let mut update = UpdateNode::new(table.clone(), "name", Value::from("b"))
            .with_child(Box::new(TableScan::new(table.clone())));
        update.open(tx).unwrap();
        assert!(matches!(update.next(), Err(ExecutorError::Transaction(_))));
        assert_eq!(table.scan()[0].1, row(1, "a", 1.0));
    }

    #[test]
    fn test_failure_aborts_remaining_rows() {
        let table = table();
        let first = table.insert(row(1, "a", 1.0));
        table.insert(row(2, "b", 2.0));
        table.insert(row(3, "c", 3.0));
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let mut update = UpdateNode::new(table.clone(), "price", Value::Floats(9.0))
            .with_child(Box::new(TableScan::new(table.clone())));
        update.open(tx.clone()).unwrap();

        // gone from the heap but still in the scan's snapshot
        table.delete(first).unwrap();

        assert!(matches!(
            update.next(),
            Err(ExecutorError::Transaction(TxError::Heap(HeapError::RecordNotFound { .. })))
        ));
        assert_eq!(update.next(), Err(ExecutorError::Aborted));
        assert_eq!(update.updated_rows(), 0);
        assert!(tx.operations().is_empty());
        let rows: Vec<_> = table.scan().into_iter().map(|(_, r)| r).collect();
        assert_eq!(rows, vec![row(2, "b", 2.0), row(3, "c", 3.0)]);

        // reopening starts over
        update.close().unwrap();
        update.open(tx.clone()).unwrap();
        assert!(!update.next().unwrap());
        assert_eq!(update.updated_rows(), 2);
    }

    #[test]
    fn test_no_child() {
        let tx = Arc::new(AutoCommitTransaction::new(TxId::new(1)));
        let mut update = UpdateNode::new(table(), "name", Value::from("b"));
        update.open(tx).unwrap();
        assert!(!update.next().unwrap());
        assert_eq!(update.updated_rows(), 0);
    }
}
