//! The transaction capability and its auto-commit implementation.

use parking_lot::Mutex;
use tracing::trace;

use crate::heap::{Record, RecordId, Table};

use super::error::TxError;
use super::types::{TxId, TxState};

/// Write capability handed to operators in `open()`.
///
/// Each call must either succeed completely or fail without side effects.
/// Implementations are shared as `Arc<dyn Transaction>`, so all methods take
/// `&self` and manage their own synchronization.
pub trait Transaction: Send + Sync {
    /// Returns this transaction's id.
    fn id(&self) -> TxId;

    /// Removes the record `rid` from `table`.
    fn delete_record(&self, table: &Table, rid: RecordId) -> Result<(), TxError>;

    /// Stores `record` in `table` and returns its new id.
    fn insert_record(&self, table: &Table, record: Record) -> Result<RecordId, TxError>;
}

/// One write applied by an [`AutoCommitTransaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOperation {
    /// A record was removed.
    Delete { table: String, rid: RecordId },
    /// A record was stored.
    Insert { table: String, rid: RecordId },
}

struct TxInner {
    state: TxState,
    journal: Vec<TxOperation>,
}

/// Transaction that applies every write to the heap immediately.
///
/// There is no undo: `abort()` only stops further writes. The journal records
/// each applied write in order and can be inspected with
/// [`operations()`](Self::operations).
pub struct AutoCommitTransaction {
    txid: TxId,
    read_only: bool,
    inner: Mutex<TxInner>,
}

impl AutoCommitTransaction {
    /// Begins a read-write transaction.
    pub fn new(txid: TxId) -> Self {
        Self::with_mode(txid, false)
    }

    /// Begins a transaction that rejects all writes.
    pub fn read_only(txid: TxId) -> Self {
        Self::with_mode(txid, true)
    }

    fn with_mode(txid: TxId, read_only: bool) -> Self {
        Self {
            txid,
            read_only,
            inner: Mutex::new(TxInner {
                state: TxState::InProgress,
                journal: Vec::new(),
            }),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> TxState {
        self.inner.lock().state
    }

    /// Returns a copy of the writes applied so far.
    pub fn operations(&self) -> Vec<TxOperation> {
        self.inner.lock().journal.clone()
    }

    /// Marks the transaction as committed.
    pub fn commit(&self) -> Result<(), TxError> {
        self.complete(TxState::Committed)
    }

    /// Marks the transaction as aborted. Applied writes stay applied.
    pub fn abort(&self) -> Result<(), TxError> {
        self.complete(TxState::Aborted)
    }

    fn complete(&self, new_state: TxState) -> Result<(), TxError> {
        let mut inner = self.inner.lock();
        if inner.state != TxState::InProgress {
            return Err(TxError::InvalidStateTransition {
                txid: self.txid,
                current: inner.state,
                attempted: new_state,
            });
        }
        inner.state = new_state;
        Ok(())
    }

    /// Runs `write` while holding the journal lock, after checking that the
    /// transaction may still write.
    fn write<T>(
        &self,
        write: impl FnOnce() -> Result<(T, TxOperation), TxError>,
    ) -> Result<T, TxError> {
        if self.read_only {
            return Err(TxError::ReadOnly(self.txid));
        }
        let mut inner = self.inner.lock();
        if inner.state != TxState::InProgress {
            return Err(TxError::NotActive {
                txid: self.txid,
                state: inner.state,
            });
        }
        let (out, op) = write()?;
        trace!(txid = %self.txid, ?op, "applied write");
        inner.journal.push(op);
        Ok(out)
    }
}

impl Transaction for AutoCommitTransaction {
    fn id(&self) -> TxId {
        self.txid
    }

    fn delete_record(&self, table: &Table, rid: RecordId) -> Result<(), TxError> {
        self.write(|| {
            table.delete(rid)?;
            let op = TxOperation::Delete {
                table: table.name().to_string(),
                rid,
            };
            Ok(((), op))
        })
    }

    fn insert_record(&self, table: &Table, record: Record) -> Result<RecordId, TxError> {
        self.write(|| {
            let rid = table.insert(record);
            let op = TxOperation::Insert {
                table: table.name().to_string(),
                rid,
            };
            Ok((rid, op))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{AttrType, Value};
    use crate::heap::{HeapError, TableMeta};

    fn table() -> Table {
        Table::new(TableMeta::new("t", [("id", AttrType::Ints, 4)]))
    }

    #[test]
    fn test_insert_then_delete_is_journaled() {
        let table = table();
        let tx = AutoCommitTransaction::new(TxId::new(1));

        let rid = tx
            .insert_record(&table, Record::new(vec![Value::Ints(1)]))
            .unwrap();
        assert_eq!(table.len(), 1);
        tx.delete_record(&table, rid).unwrap();
        assert!(table.is_empty());

        assert_eq!(
            tx.operations(),
            vec![
                TxOperation::Insert {
                    table: "t".into(),
                    rid
                },
                TxOperation::Delete {
                    table: "t".into(),
                    rid
                },
            ]
        );
    }

    #[test]
    fn test_delete_missing_record() {
        let table = table();
        let tx = AutoCommitTransaction::new(TxId::new(1));
        let err = tx.delete_record(&table, RecordId::new(9)).unwrap_err();
        assert!(matches!(err, TxError::Heap(HeapError::RecordNotFound { .. })));
        assert!(tx.operations().is_empty());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let table = table();
        let tx = AutoCommitTransaction::read_only(TxId::new(3));
        let err = tx
            .insert_record(&table, Record::new(vec![Value::Ints(1)]))
            .unwrap_err();
        assert_eq!(err, TxError::ReadOnly(TxId::new(3)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_finished_transaction_rejects_writes() {
        let table = table();
        let tx = AutoCommitTransaction::new(TxId::new(1));
        tx.commit().unwrap();
        assert_eq!(tx.state(), TxState::Committed);

        let err = tx
            .insert_record(&table, Record::new(vec![Value::Ints(1)]))
            .unwrap_err();
        assert_eq!(
            err,
            TxError::NotActive {
                txid: TxId::new(1),
                state: TxState::Committed
            }
        );
    }

    #[test]
    fn test_double_completion() {
        let tx = AutoCommitTransaction::new(TxId::new(1));
        tx.abort().unwrap();
        assert!(matches!(
            tx.commit(),
            Err(TxError::InvalidStateTransition {
                current: TxState::Aborted,
                attempted: TxState::Committed,
                ..
            })
        ));
    }
}
