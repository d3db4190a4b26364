//! Day-of-year conventions
//!
//! Every day exposed by the crate is a 1-based day-of-year. Arrays indexed by day
//! hold day `d` at position `d - 1`.

use chrono::{Datelike, NaiveDate};

/// 1-based day-of-year (`1..=366`)
pub type DayOfYear = u16;

/// Length of the day axis of a climatology
pub const DAYS_PER_CLIMATOLOGY: usize = 366;

/// Sentinel used for missing values in persisted files
pub const FILL_VALUE: i32 = -9999;

/// Months in a year
pub const MONTHS: usize = 12;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> DayOfYear {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Array position of a day-of-year
pub fn day_index(day: DayOfYear) -> usize {
    usize::from(day).saturating_sub(1)
}

/// Day-of-year stored at an array position
pub fn index_day(index: usize) -> DayOfYear {
    (index + 1) as DayOfYear
}

/// Calendar `(month, day)` of a day-of-year, both 1-based
pub fn month_day(year: i32, day: DayOfYear) -> Option<(u32, u32)> {
    let date = NaiveDate::from_yo_opt(year, u32::from(day))?;
    Some((date.month(), date.day()))
}

/// Parse the `YYYYMMDD` prefix of a granule `start_time` attribute
///
/// GHRSST granules carry values like `20030101T000000Z`.
pub fn parse_start_time(value: &str) -> Option<NaiveDate> {
    let prefix = value.trim().get(..8)?;
    NaiveDate::parse_from_str(prefix, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2004));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2003));
        assert_eq!(days_in_year(2004), 366);
        assert_eq!(days_in_year(2005), 365);
    }

    #[test]
    fn day_index_round_trip() {
        assert_eq!(day_index(1), 0);
        assert_eq!(index_day(365), 366);
        assert_eq!(index_day(day_index(200)), 200);
    }

    #[test]
    fn month_day_of_year() {
        assert_eq!(month_day(2003, 1), Some((1, 1)));
        assert_eq!(month_day(2003, 60), Some((3, 1)));
        assert_eq!(month_day(2004, 60), Some((2, 29)));
        assert_eq!(month_day(2003, 366), None);
    }

    #[test]
    fn start_time_attribute() {
        let date = parse_start_time("20030215T090000Z").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2003, 2, 15));
        assert!(parse_start_time("2003").is_none());
        assert!(parse_start_time("notadate").is_none());
    }
}
