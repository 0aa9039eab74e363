//! The aggregate operator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::tx::Transaction;

use super::aggregate::{AccumulatorSet, AggregateKind};
use super::error::ExecutorError;
use super::node::{Operator, open_child};
use super::tuple::{Tuple, ValueListTuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateState {
    Unopened,
    Open,
    Drained,
    Failed,
    Closed,
}

/// Computes whole-input aggregates over its child, emitting a single row.
///
/// Aggregate *i* reads cell *i* of each child tuple, so the child is expected
/// to project the aggregated columns in declaration order.
pub struct AggregateNode {
    kinds: Vec<AggregateKind>,
    child: Option<Box<dyn Operator>>,
    state: AggregateState,
    result: Option<ValueListTuple>,
}

impl AggregateNode {
    /// Creates an operator without a child, which aggregates zero rows.
    pub fn new(kinds: Vec<AggregateKind>) -> Self {
        Self {
            kinds,
            child: None,
            state: AggregateState::Unopened,
            result: None,
        }
    }

    /// Attaches the child operator.
    pub fn with_child(mut self, child: Box<dyn Operator>) -> Self {
        self.child = Some(child);
        self
    }

    /// Appends an aggregate column.
    pub fn add_aggregation(&mut self, kind: AggregateKind) {
        self.kinds.push(kind);
    }

    /// Returns the declared aggregates.
    pub fn kinds(&self) -> &[AggregateKind] {
        &self.kinds
    }

    fn drain(&mut self) -> Result<ValueListTuple, ExecutorError> {
        let mut set = AccumulatorSet::new(&self.kinds);
        if let Some(child) = self.child.as_mut() {
            while child.next()? {
                let tuple = child.current_tuple().ok_or(ExecutorError::NoCurrentTuple)?;
                set.feed_row(tuple)?;
            }
        }
        debug!(rows = set.row_count(), aggregates = self.kinds.len(), "aggregate drained child");
        Ok(ValueListTuple::new(set.finish()))
    }
}

impl Operator for AggregateNode {
    fn open(&mut self, trx: Arc<dyn Transaction>) -> Result<(), ExecutorError> {
        open_child(self.child.as_mut(), trx)?;
        self.state = AggregateState::Open;
        self.result = None;
        Ok(())
    }

    /// Drains the child on the first call and returns the single result row.
    ///
    /// Every later call returns `false` without touching the child. If the
    /// drain fails, the error is returned and later calls fail with
    /// [`ExecutorError::Aborted`].
    fn next(&mut self) -> Result<bool, ExecutorError> {
        match self.state {
            AggregateState::Unopened | AggregateState::Closed => return Err(ExecutorError::NotOpen),
            AggregateState::Failed => return Err(ExecutorError::Aborted),
            AggregateState::Drained => return Ok(false),
            AggregateState::Open => {}
        }
        match self.drain() {
            Ok(result) => {
                self.result = Some(result);
                self.state = AggregateState::Drained;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "aggregate failed");
                self.state = AggregateState::Failed;
                Err(e)
            }
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.result.as_ref().map(|t| t as &dyn Tuple)
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        let opened = !matches!(self.state, AggregateState::Unopened | AggregateState::Closed);
        self.state = AggregateState::Closed;
        match self.child.as_mut() {
            Some(child) if opened => child.close(),
            _ => Ok(()),
        }
    }
}
