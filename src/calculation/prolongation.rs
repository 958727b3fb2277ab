//! Prolongation merging.
//!
//! A stoppage starting on the business day right after the previous one ends
//! is a prolongation of it. Consecutive prolongations are folded into one
//! [`MergedStoppage`] that keeps the member spans, so day counts are never
//! inflated by the weekend or holiday bridging two members.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Stoppage, StoppageId};

use super::date_arithmetic::{DateSpan, inclusive_days, is_next_business_day, plus_days};
use super::holidays::HolidayCalendar;

/// A group of consecutive original stoppages treated as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedStoppage {
    /// Identifier of the first member.
    pub id: StoppageId,
    /// Start of the first member.
    pub start_date: NaiveDate,
    /// End of the last member.
    pub end_date: NaiveDate,
    /// The member spans, in order. Days between spans are not stoppage days.
    pub spans: Vec<DateSpan>,
    /// Relapse flag of the first member.
    pub relapse: Option<bool>,
    /// Declaration date of the first member.
    pub declaration_date: Option<NaiveDate>,
    /// `Some(false)` if any member is explicitly not validated.
    pub medically_validated: Option<bool>,
    /// The first forced rights-open date supplied by a member.
    pub forced_rights_date: Option<NaiveDate>,
    /// Input positions of the members; `None` when the group has one member.
    pub merged_indices: Option<Vec<usize>>,
}

impl MergedStoppage {
    fn from_original(index: usize, stoppage: &Stoppage) -> Self {
        Self {
            id: stoppage.id.clone(),
            start_date: stoppage.start_date,
            end_date: stoppage.end_date,
            spans: vec![DateSpan::new(stoppage.start_date, stoppage.end_date)],
            relapse: stoppage.relapse,
            declaration_date: stoppage.declaration_date,
            medically_validated: stoppage.medically_validated,
            forced_rights_date: stoppage.forced_rights_date,
            merged_indices: Some(vec![index]),
        }
    }

    fn absorb(&mut self, index: usize, stoppage: &Stoppage) {
        self.end_date = stoppage.end_date;
        self.spans
            .push(DateSpan::new(stoppage.start_date, stoppage.end_date));
        self.medically_validated = match (self.medically_validated, stoppage.medically_validated) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), _) | (_, Some(true)) => Some(true),
            _ => None,
        };
        if self.forced_rights_date.is_none() {
            self.forced_rights_date = stoppage.forced_rights_date;
        }
        if let Some(indices) = self.merged_indices.as_mut() {
            indices.push(index);
        }
    }

    /// Returns the number of stoppage days, summed over member spans.
    pub fn duration_days(&self) -> u32 {
        self.spans.iter().map(DateSpan::days).sum()
    }

    /// Returns the calendar date of the `n`-th stoppage day (1-based).
    ///
    /// `None` when `n` is zero or exceeds the duration.
    pub fn nth_day(&self, n: u32) -> Option<NaiveDate> {
        if n == 0 {
            return None;
        }
        let mut remaining = n;
        for span in &self.spans {
            let days = span.days();
            if remaining <= days {
                return Some(plus_days(span.start, remaining - 1));
            }
            remaining -= days;
        }
        None
    }

    /// Returns the parts of the member spans lying within `[from, to]`.
    pub fn spans_within(&self, from: NaiveDate, to: NaiveDate) -> Vec<DateSpan> {
        self.spans
            .iter()
            .filter_map(|span| span.clip(from, to))
            .collect()
    }

    /// Returns the number of stoppage days strictly before `date`.
    pub fn days_before(&self, date: NaiveDate) -> u32 {
        match date.pred_opt() {
            Some(day_before) => self
                .spans_within(self.start_date, day_before)
                .iter()
                .map(DateSpan::days)
                .sum(),
            None => 0,
        }
    }
}

/// Returns true if `next_start` continues a stoppage ending on `previous_end`.
///
/// Literal adjacency counts, as does starting on the next business day.
pub fn continues(previous_end: NaiveDate, next_start: NaiveDate, calendar: &HolidayCalendar) -> bool {
    inclusive_days(previous_end, next_start) == 2
        || is_next_business_day(previous_end, next_start, calendar)
}

/// Folds prolongations of a chronologically ordered stoppage list.
///
/// Each output group lists the input positions of its members in
/// `merged_indices` when more than one stoppage was folded in; a group
/// made of a single stoppage has `merged_indices == None`.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::{merge_prolongations, HolidayCalendar};
/// use ij_engine::models::Stoppage;
/// use chrono::NaiveDate;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
/// let stoppages = vec![
///     Stoppage::new("a", d(3, 1), d(3, 8)),   // ends on a Friday
///     Stoppage::new("b", d(3, 11), d(3, 20)), // starts the next Monday
///     Stoppage::new("c", d(5, 1), d(5, 10)),
/// ];
/// let merged = merge_prolongations(&stoppages, &HolidayCalendar::weekends_only());
///
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].merged_indices, Some(vec![0, 1]));
/// assert_eq!(merged[0].duration_days(), 18);
/// assert_eq!(merged[1].merged_indices, None);
/// ```
pub fn merge_prolongations(stoppages: &[Stoppage], calendar: &HolidayCalendar) -> Vec<MergedStoppage> {
    let mut groups: Vec<MergedStoppage> = Vec::new();

    for (index, stoppage) in stoppages.iter().enumerate() {
        match groups.last_mut() {
            Some(current) if continues(current.end_date, stoppage.start_date, calendar) => {
                tracing::debug!(
                    group = %current.id,
                    prolongation = %stoppage.id,
                    "Folding prolongation into stoppage"
                );
                current.absorb(index, stoppage);
            }
            _ => groups.push(MergedStoppage::from_original(index, stoppage)),
        }
    }

    for group in &mut groups {
        if group.merged_indices.as_ref().is_some_and(|indices| indices.len() < 2) {
            group.merged_indices = None;
        }
    }

    groups
}
