//! Business-day calendar used to detect prolongations.
//!
//! Weekends are never business days. French public holidays can be enabled,
//! and arbitrary extra dates can be configured on top.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::CalendarConfig;

/// Weekend- and holiday-aware calendar.
///
/// The French holidays observed are: New Year's Day, Easter Monday, Labour
/// Day, Victory Day, Ascension Thursday, Whit Monday, Bastille Day,
/// Assumption, All Saints' Day, Armistice Day and Christmas Day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    french_public_holidays: bool,
    extra_holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Creates a calendar.
    pub fn new(french_public_holidays: bool, extra_holidays: Vec<NaiveDate>) -> Self {
        Self {
            french_public_holidays,
            extra_holidays: extra_holidays.into_iter().collect(),
        }
    }

    /// A calendar where only Saturdays and Sundays are closed.
    pub fn weekends_only() -> Self {
        Self::default()
    }

    /// Builds the calendar described by the configuration.
    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.french_public_holidays, config.extra_holidays.clone())
    }

    /// Returns true if `date` is neither a weekend day nor a holiday.
    ///
    /// # Example
    ///
    /// ```
    /// use ij_engine::calculation::HolidayCalendar;
    /// use chrono::NaiveDate;
    ///
    /// let calendar = HolidayCalendar::new(true, vec![]);
    /// // Bastille Day 2025 is a Monday
    /// assert!(!calendar.is_business_day(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()));
    /// assert!(calendar.is_business_day(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()));
    /// ```
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        if self.extra_holidays.contains(&date) {
            return false;
        }
        !(self.french_public_holidays && is_french_public_holiday(date))
    }

    /// Returns `date` if it is a business day, otherwise the next one.
    pub fn next_business_day_on_or_after(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_business_day(current) {
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }
}

/// Returns Easter Sunday for `year` (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn is_french_public_holiday(date: NaiveDate) -> bool {
    let fixed = matches!(
        (date.month(), date.day()),
        (1, 1) | (5, 1) | (5, 8) | (7, 14) | (8, 15) | (11, 1) | (11, 11) | (12, 25)
    );
    if fixed {
        return true;
    }

    let Some(easter) = easter_sunday(date.year()) else {
        return false;
    };
    let offset = (date - easter).num_days();
    // Easter Monday, Ascension Thursday, Whit Monday
    matches!(offset, 1 | 39 | 50)
}
