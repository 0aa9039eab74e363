//! Transactions used by mutating operators.
//!
//! Operators never touch a [`Table`](crate::heap::Table) heap directly when
//! writing; they go through the [`Transaction`] capability handed to them in
//! `open()`. This module provides:
//! - [`Transaction`]: the `delete_record` / `insert_record` capability
//! - [`AutoCommitTransaction`]: applies each write immediately and journals it
//! - [`TxId`], [`TxState`]: transaction identity and lifecycle state

mod error;
mod transaction;
mod types;

pub use error::TxError;
pub use transaction::{AutoCommitTransaction, Transaction, TxOperation};
pub use types::{TxId, TxState};
