//! Errors raised by value construction and comparison.

use thiserror::Error;

use super::AttrType;

/// Errors from operations on [`Value`](super::Value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Ordering is not defined between these two kinds.
    #[error("cannot compare {left} with {right}")]
    Incomparable { left: AttrType, right: AttrType },
}

/// Errors from parsing a `YYYY-M-D` date literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The text is not three `-`-separated digit runs.
    #[error("malformed date literal \"{0}\"")]
    Malformed(String),

    /// Year outside the supported range.
    #[error("year {0} out of range")]
    YearOutOfRange(i32),

    /// Month outside `1..=12`.
    #[error("month {0} out of range")]
    MonthOutOfRange(i32),

    /// Day does not exist in the given month.
    #[error("day {day} out of range for {year}-{month:02}")]
    DayOutOfRange { year: i32, month: i32, day: i32 },

    /// Day offset beyond the last representable date.
    #[error("date offset {0} out of range")]
    OutOfRange(i32),
}
