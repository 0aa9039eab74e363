//! Day-offset date arithmetic.
//!
//! Dates are stored as the number of days since 1970-01-01. Only the window
//! `MIN_DATE..=MAX_DATE` (1970-01-01 through 2038-01-31) is considered valid.

use super::DateError;

/// First supported year.
pub const MIN_YEAR: i32 = 1970;
/// Last supported year. Dates in it are further capped by [`MAX_DATE`].
pub const MAX_YEAR: i32 = 2038;
/// Offset of 1970-01-01.
pub const MIN_DATE: i32 = 0;
/// Offset of 2038-01-31.
pub const MAX_DATE: i32 = 24867;

const MONTH_DAYS: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year rule.
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `year`.
pub const fn days_in_year(year: i32) -> i32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Number of days in `month` (1-based) of `year`.
pub const fn days_in_month(year: i32, month: i32) -> i32 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        MONTH_DAYS[(month - 1) as usize]
    }
}

/// Parses a `YYYY-M-D` literal into a day offset.
///
/// Fields are the digit runs around the first two `-` characters. Checks run
/// in order: year, month, day within month, and finally the offset window.
pub fn parse_date(s: &str) -> Result<i32, DateError> {
    let mut fields = s.splitn(3, '-');
    let (Some(y), Some(m), Some(d)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(DateError::Malformed(s.to_string()));
    };
    let year = parse_field(y, s)?;
    let month = parse_field(m, s)?;
    let day = parse_field(d, s)?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DateError::YearOutOfRange(year));
    }
    if !(1..=12).contains(&month) {
        return Err(DateError::MonthOutOfRange(month));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateError::DayOutOfRange { year, month, day });
    }

    let mut offset: i32 = (MIN_YEAR..year).map(days_in_year).sum();
    offset += (1..month).map(|m| days_in_month(year, m)).sum::<i32>();
    offset += day - 1;

    if !(MIN_DATE..=MAX_DATE).contains(&offset) {
        return Err(DateError::OutOfRange(offset));
    }
    Ok(offset)
}

fn parse_field(field: &str, literal: &str) -> Result<i32, DateError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::Malformed(literal.to_string()));
    }
    field
        .parse()
        .map_err(|_| DateError::Malformed(literal.to_string()))
}

/// Converts a day offset back to `(year, month, day)`.
///
/// Works for any offset, including ones outside the valid window.
pub fn civil_from_offset(offset: i32) -> (i32, i32, i32) {
    let mut days = offset;
    let mut year = MIN_YEAR;
    while days < 0 {
        year -= 1;
        days += days_in_year(year);
    }
    while days >= days_in_year(year) {
        days -= days_in_year(year);
        year += 1;
    }
    let mut month = 1;
    while days >= days_in_month(year, month) {
        days -= days_in_month(year, month);
        month += 1;
    }
    (year, month, days + 1)
}

/// Renders a day offset as `YYYY-MM-DD`.
pub fn format_date(offset: i32) -> String {
    let (year, month, day) = civil_from_offset(offset);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(parse_date("1970-01-01").unwrap(), 0);
        assert_eq!(parse_date("1970-1-2").unwrap(), 1);
        assert_eq!(format_date(0), "1970-01-01");
    }

    #[test]
    fn test_leap_day() {
        let offset = parse_date("2024-02-29").unwrap();
        assert_eq!(offset, 19782);
        assert_eq!(format_date(offset), "2024-02-29");
        assert_eq!(format_date(offset + 1), "2024-03-01");
    }

    #[test]
    fn test_non_leap_day_rejected() {
        assert_eq!(
            parse_date("2023-02-29"),
            Err(DateError::DayOutOfRange {
                year: 2023,
                month: 2,
                day: 29
            })
        );
    }

    #[test]
    fn test_upper_bound() {
        assert_eq!(parse_date("2037-12-31").unwrap(), 24836);
        assert_eq!(parse_date("2038-01-31").unwrap(), MAX_DATE);
        assert_eq!(parse_date("2038-02-01"), Err(DateError::OutOfRange(24868)));
        assert_eq!(format_date(MAX_DATE), "2038-01-31");
    }

    #[test]
    fn test_validation_order() {
        assert_eq!(parse_date("1969-13-40"), Err(DateError::YearOutOfRange(1969)));
        assert_eq!(parse_date("2039-01-01"), Err(DateError::YearOutOfRange(2039)));
        assert_eq!(parse_date("2000-13-40"), Err(DateError::MonthOutOfRange(13)));
        assert_eq!(parse_date("2000-0-1"), Err(DateError::MonthOutOfRange(0)));
        assert!(matches!(
            parse_date("2000-04-31"),
            Err(DateError::DayOutOfRange { day: 31, .. })
        ));
        assert!(matches!(
            parse_date("2000-04-0"),
            Err(DateError::DayOutOfRange { day: 0, .. })
        ));
    }

    #[test]
    fn test_malformed() {
        for s in ["", "2000", "2000-01", "2000-01-01-01", "20x0-01-01", "2000--1", "-1-1"] {
            assert!(
                matches!(parse_date(s), Err(DateError::Malformed(_))),
                "{s:?} should be malformed"
            );
        }
        assert!(matches!(
            parse_date("99999999999-01-01"),
            Err(DateError::Malformed(_))
        ));
    }

    #[test]
    fn test_negative_offset_formats() {
        assert_eq!(format_date(-1), "1969-12-31");
        assert_eq!(civil_from_offset(-365), (1969, 1, 1));
    }

    proptest! {
        #[test]
        fn prop_offset_round_trip(offset in MIN_DATE..=MAX_DATE) {
            let text = format_date(offset);
            prop_assert_eq!(parse_date(&text).unwrap(), offset);
        }
    }
}
