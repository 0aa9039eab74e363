//! Pull-based aggregate and update operators over a tagged value model.
//!
//! - [`datum`]: the [`Value`](datum::Value) cell type, its coercions,
//!   comparison and date handling
//! - [`heap`]: table metadata and an in-memory record heap
//! - [`tx`]: the write capability operators use to modify tables
//! - [`executor`]: the operator tree

pub mod datum;
pub mod executor;
pub mod heap;
pub mod tx;
