//! Tagged scalar values.
//!
//! This module defines the value representation shared by every operator in
//! the executor. [`AttrType`] names the kind of a value and [`Value`] carries
//! exactly one payload of that kind.
//!
//! Accessors such as [`Value::as_int()`] never fail: reading a value through
//! the "wrong" accessor coerces it following fixed rules (a non-numeric
//! string reads as `0`, a date reads as its day offset, and so on).
//! [`Value::compare()`] is the one operation that can reject its inputs,
//! since ordering is only defined within a kind and between ints and floats.

pub mod date;
mod error;

use std::cmp::Ordering;
use std::fmt;

use tracing::{trace, warn};

pub use error::{DateError, ValueError};

/// Magnitude below which a float reads as `false`.
pub const EPSILON: f32 = 1e-6;

/// Kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// No value has been assigned.
    Undefined,
    /// Variable-length character string.
    Chars,
    /// 32-bit signed integer.
    Ints,
    /// Day offset since 1970-01-01.
    Dates,
    /// 32-bit float.
    Floats,
    /// Boolean.
    Booleans,
}

impl AttrType {
    /// Returns the lowercase name used in table metadata.
    pub const fn name(self) -> &'static str {
        match self {
            AttrType::Undefined => "undefined",
            AttrType::Chars => "chars",
            AttrType::Ints => "ints",
            AttrType::Dates => "dates",
            AttrType::Floats => "floats",
            AttrType::Booleans => "booleans",
        }
    }

    /// Resolves a lowercase type name. Unknown names map to `Undefined`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "chars" => AttrType::Chars,
            "ints" => AttrType::Ints,
            "dates" => AttrType::Dates,
            "floats" => AttrType::Floats,
            "booleans" => AttrType::Booleans,
            _ => AttrType::Undefined,
        }
    }

    /// Returns true for the kinds arithmetic aggregates accept.
    pub const fn is_numeric(self) -> bool {
        matches!(self, AttrType::Ints | AttrType::Floats)
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tagged scalar.
///
/// The variant is the kind; there is no way to build a value whose kind and
/// payload disagree. `PartialEq` is structural (`Ints(3) != Floats(3.0)`);
/// use [`compare()`](Self::compare) for the engine's ordering semantics.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Unassigned value.
    #[default]
    Undefined,
    /// Owned byte string. Usually UTF-8, but any bytes are kept as-is.
    Chars(Vec<u8>),
    /// 32-bit signed integer.
    Ints(i32),
    /// Days since 1970-01-01.
    Dates(i32),
    /// 32-bit float.
    Floats(f32),
    /// Boolean.
    Booleans(bool),
}

impl Value {
    /// Builds a CHARS value from raw bytes.
    ///
    /// The string ends at the first NUL byte, or after `max_len` bytes when a
    /// maximum is given. A maximum of `Some(0)` means no limit. The bytes are
    /// stored verbatim; they need not be valid UTF-8.
    pub fn chars(bytes: &[u8], max_len: Option<usize>) -> Self {
        let limit = match max_len {
            Some(max) if max > 0 => max.min(bytes.len()),
            _ => bytes.len(),
        };
        let bytes = &bytes[..limit];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Value::Chars(bytes[..end].to_vec())
    }

    /// Builds a DATES value from a raw day offset, without range checks.
    ///
    /// Use [`parse_date()`](Self::parse_date) for validated construction.
    pub const fn date(offset: i32) -> Self {
        Value::Dates(offset)
    }

    /// Parses a `YYYY-M-D` string into a DATES value.
    ///
    /// # Errors
    ///
    /// Returns a [`DateError`] when the string is malformed or names a date
    /// outside `1970-01-01..=2038-01-31`. No value is produced in that case.
    pub fn parse_date(s: &str) -> Result<Self, DateError> {
        date::parse_date(s).map(Value::Dates)
    }

    /// Returns the kind of this value.
    pub const fn attr_type(&self) -> AttrType {
        match self {
            Value::Undefined => AttrType::Undefined,
            Value::Chars(_) => AttrType::Chars,
            Value::Ints(_) => AttrType::Ints,
            Value::Dates(_) => AttrType::Dates,
            Value::Floats(_) => AttrType::Floats,
            Value::Booleans(_) => AttrType::Booleans,
        }
    }

    /// Returns true if no value has been assigned.
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns the byte length of the payload.
    pub fn length(&self) -> usize {
        match self {
            Value::Undefined => 0,
            Value::Chars(s) => s.len(),
            Value::Ints(_) | Value::Dates(_) => size_of::<i32>(),
            Value::Floats(_) => size_of::<f32>(),
            Value::Booleans(_) => size_of::<bool>(),
        }
    }

    /// Replaces this value's kind and payload with a copy of `other`.
    pub fn set_value(&mut self, other: &Value) {
        self.clone_from(other);
    }

    /// Reads this value as an integer.
    ///
    /// Strings parse their leading numeric prefix (0 on failure), floats
    /// truncate toward zero and dates yield their day offset.
    pub fn as_int(&self) -> i32 {
        match self {
            Value::Undefined => 0,
            Value::Chars(s) => parse_int_prefix(utf8_prefix(s)).unwrap_or_else(|| {
                trace!(value = %String::from_utf8_lossy(s), "failed to convert string to integer");
                0
            }),
            Value::Ints(n) | Value::Dates(n) => *n,
            Value::Floats(f) => *f as i32,
            Value::Booleans(b) => i32::from(*b),
        }
    }

    /// Reads this value as a float.
    pub fn as_float(&self) -> f32 {
        match self {
            Value::Undefined => 0.0,
            Value::Chars(s) => parse_float_prefix(utf8_prefix(s)).unwrap_or_else(|| {
                trace!(value = %String::from_utf8_lossy(s), "failed to convert string to float");
                0.0
            }),
            Value::Ints(n) | Value::Dates(n) => *n as f32,
            Value::Floats(f) => *f,
            Value::Booleans(b) => f32::from(u8::from(*b)),
        }
    }

    /// Reads this value as a boolean.
    ///
    /// A string is true when it parses to a nonzero number; otherwise it is
    /// true iff it is non-empty. A date is true iff it lies in the valid range.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Chars(bytes) => {
                let s = utf8_prefix(bytes);
                if parse_float_prefix(s).is_some_and(|f| f.abs() >= EPSILON) {
                    return true;
                }
                if parse_int_prefix(s).is_some_and(|n| n != 0) {
                    return true;
                }
                !bytes.is_empty()
            }
            Value::Ints(n) => *n != 0,
            Value::Dates(d) => (date::MIN_DATE..=date::MAX_DATE).contains(d),
            Value::Floats(f) => f.abs() >= EPSILON,
            Value::Booleans(b) => *b,
        }
    }

    /// Orders two values.
    ///
    /// Same-kind values compare naturally (strings byte-wise); ints and
    /// floats compare after promoting the int to float.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Incomparable`] for any other pair of kinds,
    /// including when either side is undefined.
    pub fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        let ord = match (self, other) {
            (Value::Ints(a), Value::Ints(b)) | (Value::Dates(a), Value::Dates(b)) => a.cmp(b),
            (Value::Floats(a), Value::Floats(b)) => compare_float(*a, *b),
            (Value::Ints(a), Value::Floats(b)) => compare_float(*a as f32, *b),
            (Value::Floats(a), Value::Ints(b)) => compare_float(*a, *b as f32),
            (Value::Booleans(a), Value::Booleans(b)) => a.cmp(b),
            (Value::Chars(a), Value::Chars(b)) => a.cmp(b),
            _ => {
                warn!(left = %self.attr_type(), right = %other.attr_type(), "comparison not supported");
                return Err(ValueError::Incomparable {
                    left: self.attr_type(),
                    right: other.attr_type(),
                });
            }
        };
        Ok(ord)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => Ok(()),
            Value::Chars(s) => f.write_str(&String::from_utf8_lossy(s)),
            Value::Ints(n) => write!(f, "{}", n),
            // Rust's float Display is already the shortest round-trip form.
            Value::Floats(n) => write!(f, "{}", n),
            Value::Booleans(b) => write!(f, "{}", u8::from(*b)),
            Value::Dates(d) => f.write_str(&date::format_date(*d)),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Ints(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Floats(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Booleans(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::chars(s.as_bytes(), None)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::chars(s.as_bytes(), None)
    }
}

/// Longest valid UTF-8 prefix of `bytes`. Numeric parsing only looks at
/// ASCII, so trailing invalid bytes never matter.
fn utf8_prefix(bytes: &[u8]) -> &str {
    match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// IEEE ordering with NaN treated as equal.
fn compare_float(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Length of the run of ASCII digits at the start of `s`.
fn digit_run(s: &[u8]) -> usize {
    s.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parses `[ws][+-]digits` at the start of `s`, ignoring any trailing text.
///
/// Returns `None` when there are no digits or the number overflows `i64`;
/// values beyond the `i32` range saturate.
fn parse_int_prefix(s: &str) -> Option<i32> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = digit_run(&bytes[sign..]);
    if digits == 0 {
        return None;
    }
    let n: i64 = t[..sign + digits].parse().ok()?;
    Some(n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Parses the longest float literal at the start of `s`, ignoring any
/// trailing text. Accepts `inf`, `infinity` and `nan` in any case.
fn parse_float_prefix(s: &str) -> Option<f32> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let rest = t[end..].to_ascii_lowercase();
    for word in ["infinity", "inf", "nan"] {
        if rest.starts_with(word) {
            return t[..end + word.len()].parse().ok();
        }
    }

    let int_digits = digit_run(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digit_run(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digit_run(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    t[..end].parse().ok()
}
