//! Aggregate function definitions and accumulators.
//!
//! - [`AggregateKind`]: the supported aggregate functions
//! - [`Accumulator`]: trait for stateful aggregate computation
//! - [`AccumulatorSet`]: one accumulator per declared aggregate column, fed a
//!   whole tuple at a time

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::datum::{AttrType, Value};

use super::error::ExecutorError;
use super::tuple::Tuple;

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// COUNT(expr): rows consumed.
    Count,
    /// COUNT(\*): rows consumed, without reading the cell.
    CountStar,
    /// SUM: sum of numeric cells.
    Sum,
    /// AVG: mean of numeric cells.
    Avg,
    /// MAX: greatest comparable cell.
    Max,
    /// MIN: least comparable cell.
    Min,
}

impl AggregateKind {
    /// Resolves a function name (case-insensitive) to an aggregate kind.
    pub fn from_name(name: &str) -> Result<Self, ExecutorError> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateKind::Count),
            "count(*)" => Ok(AggregateKind::CountStar),
            "sum" => Ok(AggregateKind::Sum),
            "avg" => Ok(AggregateKind::Avg),
            "max" => Ok(AggregateKind::Max),
            "min" => Ok(AggregateKind::Min),
            _ => Err(ExecutorError::Unimplemented(format!(
                "aggregate function {name}"
            ))),
        }
    }

    /// Whether the aggregate reads its column's cell.
    pub fn reads_cell(self) -> bool {
        self != AggregateKind::CountStar
    }

    /// Creates a fresh accumulator for this aggregate.
    pub fn create_accumulator(self) -> Box<dyn Accumulator> {
        match self {
            AggregateKind::Count | AggregateKind::CountStar => {
                Box::new(CountAccumulator { count: 0 })
            }
            AggregateKind::Sum => Box::new(SumAccumulator { sum: None }),
            AggregateKind::Avg => Box::new(AvgAccumulator { mean: 0.0, count: 0 }),
            AggregateKind::Max => Box::new(ExtremumAccumulator::new(AggregateKind::Max)),
            AggregateKind::Min => Box::new(ExtremumAccumulator::new(AggregateKind::Min)),
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateKind::Count => write!(f, "COUNT"),
            AggregateKind::CountStar => write!(f, "COUNT(*)"),
            AggregateKind::Sum => write!(f, "SUM"),
            AggregateKind::Avg => write!(f, "AVG"),
            AggregateKind::Max => write!(f, "MAX"),
            AggregateKind::Min => write!(f, "MIN"),
        }
    }
}

/// Stateful aggregate computation.
///
/// Follows a three-phase lifecycle: creation → feed → finish. `feed` is
/// called once per input row. For COUNT(\*) the value is
/// [`Value::Undefined`] and ignored.
pub trait Accumulator: Send {
    /// Feeds a single cell into the accumulator.
    fn feed(&mut self, value: &Value) -> Result<(), ExecutorError>;

    /// Produces the final aggregate result. Accumulators that never saw a
    /// contributing value return [`Value::Undefined`], except COUNT which
    /// returns 0.
    fn finish(&self) -> Value;
}

/// Numeric payload of a cell that SUM and AVG accept.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Ints(n) => Some(f64::from(*n)),
        Value::Floats(n) => Some(f64::from(*n)),
        _ => None,
    }
}

/// COUNT and COUNT(\*) accumulator.
struct CountAccumulator {
    count: i32,
}

impl Accumulator for CountAccumulator {
    fn feed(&mut self, _value: &Value) -> Result<(), ExecutorError> {
        self.count = self.count.saturating_add(1);
        Ok(())
    }

    fn finish(&self) -> Value {
        Value::Ints(self.count)
    }
}

/// SUM accumulator. Non-numeric cells are skipped.
struct SumAccumulator {
    sum: Option<f64>,
}

impl Accumulator for SumAccumulator {
    fn feed(&mut self, value: &Value) -> Result<(), ExecutorError> {
        match numeric(value) {
            Some(n) => *self.sum.get_or_insert(0.0) += n,
            None => trace!(kind = %value.attr_type(), "SUM skipped non-numeric cell"),
        }
        Ok(())
    }

    fn finish(&self) -> Value {
        self.sum.map_or(Value::Undefined, |s| Value::Floats(s as f32))
    }
}

/// AVG accumulator.
///
/// Keeps a running mean over the contributing (numeric) cells only.
struct AvgAccumulator {
    mean: f64,
    count: u64,
}

impl Accumulator for AvgAccumulator {
    fn feed(&mut self, value: &Value) -> Result<(), ExecutorError> {
        let Some(n) = numeric(value) else {
            trace!(kind = %value.attr_type(), "AVG skipped non-numeric cell");
            return Ok(());
        };
        self.count += 1;
        let count = self.count as f64;
        self.mean = (self.mean * (count - 1.0) + n) / count;
        Ok(())
    }

    fn finish(&self) -> Value {
        if self.count == 0 {
            Value::Undefined
        } else {
            Value::Floats(self.mean as f32)
        }
    }
}

/// MAX and MIN accumulator.
///
/// Seeded from the first value fed; later values replace it when they
/// compare greater (MAX) or less (MIN).
struct ExtremumAccumulator {
    kind: AggregateKind,
    keep: Ordering,
    current: Option<Value>,
}

impl ExtremumAccumulator {
    fn new(kind: AggregateKind) -> Self {
        let keep = if kind == AggregateKind::Max {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        Self {
            kind,
            keep,
            current: None,
        }
    }
}

impl Accumulator for ExtremumAccumulator {
    fn feed(&mut self, value: &Value) -> Result<(), ExecutorError> {
        if matches!(value.attr_type(), AttrType::Booleans | AttrType::Undefined) {
            return Err(ExecutorError::Unimplemented(format!(
                "{} over {} values",
                self.kind,
                value.attr_type()
            )));
        }
        match &mut self.current {
            Some(current) => {
                if value.compare(current)? == self.keep {
                    *current = value.clone();
                }
            }
            None => self.current = Some(value.clone()),
        }
        Ok(())
    }

    fn finish(&self) -> Value {
        self.current.clone().unwrap_or_default()
    }
}

/// The accumulators of one aggregate operator, one per declared column.
///
/// Column *i* of every input tuple feeds the accumulator of aggregate *i*.
pub struct AccumulatorSet {
    kinds: Vec<AggregateKind>,
    slots: Vec<Box<dyn Accumulator>>,
    row_count: u64,
}

impl AccumulatorSet {
    pub fn new(kinds: &[AggregateKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            slots: kinds.iter().map(|k| k.create_accumulator()).collect(),
            row_count: 0,
        }
    }

    /// Number of rows fed so far.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Feeds one input row to every accumulator.
    ///
    /// # Errors
    ///
    /// Fails if a cell read by an aggregate is missing, or if an accumulator
    /// rejects its cell. The set is left partially updated and should be
    /// discarded.
    pub fn feed_row(&mut self, tuple: &dyn Tuple) -> Result<(), ExecutorError> {
        self.row_count += 1;
        for (index, (kind, slot)) in self.kinds.iter().zip(&mut self.slots).enumerate() {
            if kind.reads_cell() {
                slot.feed(&tuple.cell_at(index)?)?;
            } else {
                slot.feed(&Value::Undefined)?;
            }
        }
        Ok(())
    }

    /// Produces one result cell per declared aggregate.
    pub fn finish(&self) -> Vec<Value> {
        self.slots.iter().map(|slot| slot.finish()).collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::datum::ValueError;
    use crate::executor::ValueListTuple;

    fn run(kind: AggregateKind, values: &[Value]) -> Result<Value, ExecutorError> {
        let mut acc = kind.create_accumulator();
        for v in values {
            acc.feed(v)?;
        }
        Ok(acc.finish())
    }

    #[test]
    fn test_from_name() {
        assert_eq!(AggregateKind::from_name("SUM").unwrap(), AggregateKind::Sum);
        assert_eq!(
            AggregateKind::from_name("Count(*)").unwrap(),
            AggregateKind::CountStar
        );
        assert!(matches!(
            AggregateKind::from_name("median"),
            Err(ExecutorError::Unimplemented(_))
        ));
        assert_eq!(AggregateKind::CountStar.to_string(), "COUNT(*)");
        assert_eq!(AggregateKind::Avg.to_string(), "AVG");
    }

    #[test]
    fn test_count() {
        let values = [Value::Ints(1), Value::from("x"), Value::Undefined];
        assert_eq!(run(AggregateKind::Count, &values).unwrap(), Value::Ints(3));
        assert_eq!(run(AggregateKind::CountStar, &[]).unwrap(), Value::Ints(0));
    }

    #[test]
    fn test_sum() {
        let ints = [Value::Ints(1), Value::Ints(2), Value::Ints(3)];
        assert_eq!(run(AggregateKind::Sum, &ints).unwrap(), Value::Floats(6.0));

        let mixed = [Value::Ints(1), Value::Floats(0.5), Value::from("7")];
        assert_eq!(run(AggregateKind::Sum, &mixed).unwrap(), Value::Floats(1.5));

        assert_eq!(run(AggregateKind::Sum, &[]).unwrap(), Value::Undefined);
        assert_eq!(
            run(AggregateKind::Sum, &[Value::from("a")]).unwrap(),
            Value::Undefined
        );
    }

    #[test]
    fn test_avg_skips_strings() {
        let values = [Value::Ints(2), Value::from("x"), Value::Floats(4.0)];
        assert_eq!(run(AggregateKind::Avg, &values).unwrap(), Value::Floats(3.0));
        assert_eq!(run(AggregateKind::Avg, &[]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_avg_count_past_u32() {
        let mut acc = AvgAccumulator {
            mean: 5.0,
            count: u64::from(u32::MAX),
        };
        acc.feed(&Value::Ints(5)).unwrap();
        assert_eq!(acc.count, 1 << 32);
        assert_eq!(acc.finish(), Value::Floats(5.0));
    }

    #[test]
    fn test_max_min_strings() {
        let values = ["banana", "apple", "cherry"].map(Value::from);
        assert_eq!(run(AggregateKind::Max, &values).unwrap(), Value::from("cherry"));
        assert_eq!(run(AggregateKind::Min, &values).unwrap(), Value::from("apple"));

        // raw bytes, not their lossy rendering
        let values = [Value::chars(&[0xfe], None), Value::chars(&[0xff], None)];
        assert_eq!(run(AggregateKind::Max, &values).unwrap(), Value::chars(&[0xff], None));
    }

    #[test]
    fn test_max_min_dates() {
        let values = [100, 50, 200].map(Value::date);
        assert_eq!(run(AggregateKind::Max, &values).unwrap(), Value::Dates(200));
        assert_eq!(run(AggregateKind::Min, &values).unwrap(), Value::Dates(50));
    }

    #[test]
    fn test_max_negative_only() {
        let values = [-5, -2, -9].map(Value::Ints);
        assert_eq!(run(AggregateKind::Max, &values).unwrap(), Value::Ints(-2));
        assert_eq!(run(AggregateKind::Min, &values).unwrap(), Value::Ints(-9));
    }

    #[test]
    fn test_max_mixed_numeric() {
        let values = [Value::Ints(3), Value::Floats(3.5), Value::Ints(2)];
        assert_eq!(run(AggregateKind::Max, &values).unwrap(), Value::Floats(3.5));
        assert_eq!(run(AggregateKind::Min, &values).unwrap(), Value::Ints(2));
    }

    #[test]
    fn test_max_unsupported_kinds() {
        assert!(matches!(
            run(AggregateKind::Max, &[Value::Booleans(true)]),
            Err(ExecutorError::Unimplemented(_))
        ));
        assert!(matches!(
            run(AggregateKind::Min, &[Value::Undefined]),
            Err(ExecutorError::Unimplemented(_))
        ));
        assert_eq!(
            run(AggregateKind::Max, &[Value::Ints(1), Value::from("a")]),
            Err(ExecutorError::Value(ValueError::Incomparable {
                left: AttrType::Chars,
                right: AttrType::Ints,
            }))
        );
        assert_eq!(run(AggregateKind::Max, &[]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_accumulator_set() {
        let kinds = [AggregateKind::CountStar, AggregateKind::Sum, AggregateKind::Max];
        let mut set = AccumulatorSet::new(&kinds);
        for n in [4, 7] {
            let row = ValueListTuple::new(vec![Value::Undefined, Value::Ints(n), Value::Ints(n)]);
            set.feed_row(&row).unwrap();
        }
        assert_eq!(set.row_count(), 2);
        assert_eq!(
            set.finish(),
            vec![Value::Ints(2), Value::Floats(11.0), Value::Ints(7)]
        );
    }

    #[test]
    fn test_accumulator_set_short_row() {
        let mut set = AccumulatorSet::new(&[AggregateKind::CountStar, AggregateKind::Count]);
        let row = ValueListTuple::new(vec![Value::Ints(1)]);
        assert_eq!(
            set.feed_row(&row),
            Err(ExecutorError::ColumnIndexOutOfBounds { index: 1, len: 1 })
        );

        // COUNT(*) never reads its cell
        let mut set = AccumulatorSet::new(&[AggregateKind::Sum, AggregateKind::CountStar]);
        set.feed_row(&row).unwrap();
        assert_eq!(set.finish(), vec![Value::Floats(1.0), Value::Ints(1)]);
    }

    proptest! {
        #[test]
        fn prop_avg_is_arithmetic_mean(values in prop::collection::vec(-1_000_000i32..1_000_000, 1..200)) {
            let cells: Vec<Value> = values.iter().copied().map(Value::Ints).collect();
            let Value::Floats(avg) = run(AggregateKind::Avg, &cells).unwrap() else {
                panic!("AVG must produce a float");
            };
            let expected = values.iter().map(|&n| f64::from(n)).sum::<f64>() / values.len() as f64;
            prop_assert!(
                (f64::from(avg) - expected).abs() <= 1e-3 * expected.abs().max(1.0),
                "avg {} expected {}", avg, expected
            );
        }
    }
}
