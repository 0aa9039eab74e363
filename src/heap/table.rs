//! Table metadata and the in-memory record heap.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::datum::{AttrType, Value};

use super::{HeapError, Record, RecordId};

/// Metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Column name.
    pub name: String,
    /// Declared kind of the column's values.
    pub attr_type: AttrType,
    /// 0-based column position.
    pub field_num: usize,
    /// Maximum payload length in bytes (string length for CHARS columns).
    pub len: usize,
}

impl FieldMeta {
    /// Creates metadata for a column at position `field_num`.
    pub fn new(name: impl Into<String>, attr_type: AttrType, field_num: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            attr_type,
            field_num,
            len,
        }
    }
}

/// Schema of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Table name.
    pub name: String,
    /// Columns in position order.
    pub fields: Vec<FieldMeta>,
}

impl TableMeta {
    /// Builds a schema from `(name, kind, len)` triples, numbering fields in order.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (S, AttrType, usize)>,
    ) -> Self {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(num, (field, ty, len))| FieldMeta::new(field, ty, num, len))
            .collect();
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Returns the number of columns.
    pub fn field_num(&self) -> usize {
        self.fields.len()
    }

    /// Finds a column by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the position of the column called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

struct TableHeap {
    next_rid: u64,
    records: BTreeMap<RecordId, Record>,
}

/// A table: schema plus an in-memory heap of records.
///
/// The heap sits behind a mutex so a shared `Arc<Table>` can be read by scans
/// and written by transactions. Every method locks for the duration of a
/// single call only.
pub struct Table {
    meta: TableMeta,
    heap: Mutex<TableHeap>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(meta: TableMeta) -> Self {
        Self {
            meta,
            heap: Mutex::new(TableHeap {
                next_rid: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Returns the table's name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns the table's schema.
    pub fn table_meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Validates `values` against the schema and wraps them in a [`Record`].
    ///
    /// # Errors
    ///
    /// Fails when the value count differs from the field count, when a value's
    /// kind differs from its field's kind, or when a string exceeds the field
    /// length.
    pub fn make_record(&self, values: Vec<Value>) -> Result<Record, HeapError> {
        if values.len() != self.meta.field_num() {
            return Err(HeapError::FieldCountMismatch {
                table: self.meta.name.clone(),
                expected: self.meta.field_num(),
                found: values.len(),
            });
        }
        for (field, value) in self.meta.fields.iter().zip(&values) {
            if field.attr_type != value.attr_type() {
                return Err(HeapError::FieldTypeMismatch {
                    field: field.name.clone(),
                    expected: field.attr_type,
                    found: value.attr_type(),
                });
            }
            if field.attr_type == AttrType::Chars && value.length() > field.len {
                return Err(HeapError::CharsTooLong {
                    field: field.name.clone(),
                    len: value.length(),
                    max: field.len,
                });
            }
        }
        Ok(Record::new(values))
    }

    /// Stores a record and returns its new id.
    pub fn insert(&self, record: Record) -> RecordId {
        let mut heap = self.heap.lock();
        let rid = RecordId::new(heap.next_rid);
        heap.next_rid += 1;
        heap.records.insert(rid, record);
        rid
    }

    /// Removes and returns the record with id `rid`.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::RecordNotFound`] if no such record exists.
    pub fn delete(&self, rid: RecordId) -> Result<Record, HeapError> {
        self.heap
            .lock()
            .records
            .remove(&rid)
            .ok_or_else(|| HeapError::RecordNotFound {
                table: self.meta.name.clone(),
                rid,
            })
    }

    /// Returns a copy of the record with id `rid`.
    pub fn get(&self, rid: RecordId) -> Option<Record> {
        self.heap.lock().records.get(&rid).cloned()
    }

    /// Returns a snapshot of all records in id order.
    pub fn scan(&self) -> Vec<(RecordId, Record)> {
        self.heap
            .lock()
            .records
            .iter()
            .map(|(rid, record)| (*rid, record.clone()))
            .collect()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.heap.lock().records.len()
    }

    /// Returns true if the heap holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("meta", &self.meta)
            .field("records", &self.len())
            .finish()
    }
}
