//! Executor-specific errors.

use thiserror::Error;

use crate::datum::ValueError;
use crate::heap::HeapError;
use crate::tx::TxError;

/// Errors that can occur during query execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Cell index exceeds the number of cells in the tuple.
    #[error("column index {index} out of bounds for tuple with {len} cells")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    /// Aggregate function or aggregate/type pairing that has no defined rule.
    #[error("unimplemented: {0}")]
    Unimplemented(String),

    /// Referenced field does not exist in the table.
    #[error("field \"{field}\" does not exist in table \"{table}\"")]
    FieldNotFound { table: String, field: String },

    /// Child tuple is not backed by a stored record.
    #[error("child tuple does not reference a stored record")]
    NotARowTuple,

    /// Child reported a row but exposes no current tuple.
    #[error("child operator produced no current tuple")]
    NoCurrentTuple,

    /// `next()` called before `open()` or after `close()`.
    #[error("operator is not open")]
    NotOpen,

    /// `next()` called again after a failed drain.
    #[error("operator was aborted by an earlier failure")]
    Aborted,

    /// Value comparison failed.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Record construction or heap access failed.
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Transactional write failed.
    #[error(transparent)]
    Transaction(#[from] TxError),

    /// Opaque failure reported by an external child operator.
    #[error("{0}")]
    Child(String),
}
