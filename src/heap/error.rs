//! Error types for the heap module.

use thiserror::Error;

use crate::datum::AttrType;

use super::RecordId;

/// Errors from record construction and heap access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// Number of values does not match the table's field count.
    #[error("table \"{table}\" has {expected} fields, got {found} values")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    /// Value kind does not match the field's declared kind.
    #[error("field \"{field}\" expects {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: AttrType,
        found: AttrType,
    },

    /// String longer than the field allows.
    #[error("value for field \"{field}\" is {len} bytes, limit is {max}")]
    CharsTooLong { field: String, len: usize, max: usize },

    /// No record with this id in the table.
    #[error("record {rid} not found in table \"{table}\"")]
    RecordNotFound { table: String, rid: RecordId },
}
