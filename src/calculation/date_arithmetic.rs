//! Calendar-date arithmetic shared by the pipeline stages.
//!
//! All day counts are inclusive of both ends. Spans are never negative: an
//! inverted pair of dates counts as zero days.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::holidays::HolidayCalendar;

/// Returns the number of days from `a` to `b`, both included.
///
/// Yields 0 when `a > b`.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::inclusive_days;
/// use chrono::NaiveDate;
///
/// let jan_1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let jan_31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// assert_eq!(inclusive_days(jan_1, jan_31), 31);
/// assert_eq!(inclusive_days(jan_1, jan_1), 1);
/// assert_eq!(inclusive_days(jan_31, jan_1), 0);
/// ```
pub fn inclusive_days(a: NaiveDate, b: NaiveDate) -> u32 {
    if a > b {
        return 0;
    }
    ((b - a).num_days() + 1) as u32
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    /// First day of the span.
    pub start: NaiveDate,
    /// Last day of the span (inclusive).
    pub end: NaiveDate,
}

impl DateSpan {
    /// Creates a span.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns the number of days in the span.
    pub fn days(&self) -> u32 {
        inclusive_days(self.start, self.end)
    }

    /// Returns the part of the span within `[from, to]`, if any.
    pub fn clip(&self, from: NaiveDate, to: NaiveDate) -> Option<DateSpan> {
        let start = self.start.max(from);
        let end = self.end.min(to);
        (start <= end).then_some(DateSpan { start, end })
    }
}

/// A sub-interval of a date range lying within one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSegment {
    /// The calendar year of the segment.
    pub year: i32,
    /// First day of the segment.
    pub start: NaiveDate,
    /// Last day of the segment (inclusive).
    pub end: NaiveDate,
    /// Number of days in the segment.
    pub days: u32,
}

/// Splits `[start, end]` into contiguous per-calendar-year segments.
///
/// Returns an empty list when `start > end`.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::split_by_calendar_year;
/// use chrono::NaiveDate;
///
/// let segments = split_by_calendar_year(
///     NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
/// );
/// assert_eq!(segments.len(), 2);
/// assert_eq!((segments[0].year, segments[0].days), (2024, 12));
/// assert_eq!((segments[1].year, segments[1].days), (2025, 10));
/// ```
pub fn split_by_calendar_year(start: NaiveDate, end: NaiveDate) -> Vec<YearSegment> {
    let mut segments = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let year = cursor.year();
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(end);
        let segment_end = year_end.min(end);
        segments.push(YearSegment {
            year,
            start: cursor,
            end: segment_end,
            days: inclusive_days(cursor, segment_end),
        });
        match segment_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }

    segments
}

/// Returns the calendar quarter (1 to 4) containing `date`.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Counts affiliation quarters from the quarter containing `affiliation_date`
/// through the quarter containing `reference_date`, both included.
///
/// The starting quarter counts in full even when affiliation falls mid-quarter.
/// Returns 0 when the reference date precedes affiliation.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::calculate_trimesters;
/// use chrono::NaiveDate;
///
/// let affiliation = NaiveDate::from_ymd_opt(2022, 2, 15).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
/// // (2024 - 2022) * 4 + (1 - 1) + 1
/// assert_eq!(calculate_trimesters(affiliation, reference), 9);
/// ```
pub fn calculate_trimesters(affiliation_date: NaiveDate, reference_date: NaiveDate) -> u32 {
    if reference_date < affiliation_date {
        return 0;
    }
    let years = (reference_date.year() - affiliation_date.year()) as i64;
    let quarters = years * 4 + quarter_of(reference_date) as i64 - quarter_of(affiliation_date) as i64 + 1;
    quarters.max(0) as u32
}

/// Returns true iff `date_b` is the first business day on or after `date_a + 1 day`.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::{is_next_business_day, HolidayCalendar};
/// use chrono::NaiveDate;
///
/// let calendar = HolidayCalendar::weekends_only();
/// let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
/// assert!(is_next_business_day(friday, monday, &calendar));
/// ```
pub fn is_next_business_day(date_a: NaiveDate, date_b: NaiveDate, calendar: &HolidayCalendar) -> bool {
    date_a
        .succ_opt()
        .map(|next| calendar.next_business_day_on_or_after(next) == date_b)
        .unwrap_or(false)
}

/// Adds whole years to a date, clamping Feb 29 to Feb 28 when needed.
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MAX)
}

/// Returns the last day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

/// Returns the date `days` days after `date`.
pub(crate) fn plus_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MAX)
}
