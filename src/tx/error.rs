//! Transaction error types.

use thiserror::Error;

use crate::heap::HeapError;

use super::types::{TxId, TxState};

/// Errors that can occur during transactional writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Write attempted through a read-only transaction.
    #[error("transaction {0} is read-only")]
    ReadOnly(TxId),

    /// Write attempted after the transaction finished.
    #[error("transaction {txid} is {state}")]
    NotActive { txid: TxId, state: TxState },

    /// Invalid state transition (e.g. committing an aborted transaction).
    #[error("invalid state transition for transaction {txid}: {current} -> {attempted}")]
    InvalidStateTransition {
        txid: TxId,
        current: TxState,
        attempted: TxState,
    },

    /// The heap rejected the operation.
    #[error(transparent)]
    Heap(#[from] HeapError),
}
