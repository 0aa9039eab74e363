//! In-memory table heap.
//!
//! A [`Table`] pairs its [`TableMeta`] schema with an unordered collection of
//! [`Record`]s addressed by [`RecordId`]. The heap is the storage the update
//! operator mutates through a transaction; scans take snapshots of it.
//!
//! - [`Record`]: the cell values of one stored row
//! - [`FieldMeta`] / [`TableMeta`]: column metadata and name lookup
//! - [`Table`]: schema-checked record construction and heap access

mod error;
mod record;
mod table;

pub use error::HeapError;
pub use record::{Record, RecordId};
pub use table::{FieldMeta, Table, TableMeta};
