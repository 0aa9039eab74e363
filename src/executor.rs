//! Query executor implementing the Volcano iterator model.
//!
//! Operators are pulled by their parent through the [`Operator`] trait and
//! expose each row as a [`Tuple`].
//!
//! # Architecture
//!
//! ```text
//! AggregateNode / UpdateNode
//!     └── Filter (optional)
//!           └── TableScan / ValuesScan
//! ```
//!
//! # Components
//!
//! - [`AggregateNode`]: COUNT, COUNT(\*), SUM, AVG, MAX and MIN over the
//!   whole input, producing one row
//! - [`UpdateNode`]: rewrites one field of every input row through a
//!   [`Transaction`](crate::tx::Transaction)
//! - [`TableScan`], [`ValuesScan`], [`Filter`]: row sources and selection
//! - [`AggregateKind`], [`Accumulator`]: aggregate function definitions

mod aggregate;
mod aggregate_node;
mod dml;
mod error;
mod node;
mod tuple;

pub use aggregate::{Accumulator, AccumulatorSet, AggregateKind};
pub use aggregate_node::AggregateNode;
pub use dml::UpdateNode;
pub use error::ExecutorError;
pub use node::{CompOp, FieldPredicate, Filter, Operator, TableScan, ValuesScan};
pub use tuple::{RowTuple, Tuple, ValueListTuple};
