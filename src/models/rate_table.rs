//! Rate table model.
//!
//! A [`RateTable`] holds date-ranged [`RateRow`]s, each carrying the nine
//! daily rates (three classes by three tiers). It is built once and never
//! mutated, so a single instance can be shared by concurrent calculations.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{Classe, RateTier};

/// One row of the rate table, valid from `date_start` to `date_end` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRow {
    /// First day the row applies to.
    pub date_start: NaiveDate,
    /// Last day the row applies to (inclusive).
    pub date_end: NaiveDate,
    /// Class A, tier 1.
    pub taux_a1: Decimal,
    /// Class A, tier 2.
    pub taux_a2: Decimal,
    /// Class A, tier 3.
    pub taux_a3: Decimal,
    /// Class B, tier 1.
    pub taux_b1: Decimal,
    /// Class B, tier 2.
    pub taux_b2: Decimal,
    /// Class B, tier 3.
    pub taux_b3: Decimal,
    /// Class C, tier 1.
    pub taux_c1: Decimal,
    /// Class C, tier 2.
    pub taux_c2: Decimal,
    /// Class C, tier 3.
    pub taux_c3: Decimal,
}

impl RateRow {
    /// Returns the daily rate for a class and tier.
    pub fn rate(&self, classe: Classe, tier: RateTier) -> Decimal {
        match (classe, tier) {
            (Classe::A, RateTier::Full) => self.taux_a1,
            (Classe::A, RateTier::Reduced) => self.taux_a2,
            (Classe::A, RateTier::FurtherReduced) => self.taux_a3,
            (Classe::B, RateTier::Full) => self.taux_b1,
            (Classe::B, RateTier::Reduced) => self.taux_b2,
            (Classe::B, RateTier::FurtherReduced) => self.taux_b3,
            (Classe::C, RateTier::Full) => self.taux_c1,
            (Classe::C, RateTier::Reduced) => self.taux_c2,
            (Classe::C, RateTier::FurtherReduced) => self.taux_c3,
        }
    }

    /// Returns true if the row covers `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }
}

/// Outcome of looking a date up in the [`RateTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLookup<'a> {
    /// A row covers the date.
    Found(&'a RateRow),
    /// The date lies in or after the first calendar year without any row.
    /// Callers may fall back to the PASS formula.
    BeyondCoverage,
    /// The date lies before the first row or in a hole inside covered history.
    Uncovered,
}

/// Immutable, date-indexed table of daily rates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTable {
    /// Rows sorted by `date_start`, mutually exclusive.
    rows: Vec<RateRow>,
}

impl RateTable {
    /// Builds a table, sorting the rows and rejecting inverted or
    /// overlapping ranges.
    pub fn new(rows: Vec<RateRow>) -> EngineResult<Self> {
        let mut rows = rows;
        rows.sort_by(|a, b| a.date_start.cmp(&b.date_start));

        for row in &rows {
            if row.date_end < row.date_start {
                return Err(EngineError::InvalidRateTable {
                    message: format!(
                        "row starting {} ends before it starts ({})",
                        row.date_start, row.date_end
                    ),
                });
            }
        }
        for pair in rows.windows(2) {
            if pair[1].date_start <= pair[0].date_end {
                return Err(EngineError::InvalidRateTable {
                    message: format!(
                        "rows starting {} and {} overlap",
                        pair[0].date_start, pair[1].date_start
                    ),
                });
            }
        }

        Ok(Self { rows })
    }

    /// Returns the rows, oldest first.
    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns January 1st of the first calendar year with no row at all.
    ///
    /// `None` for an empty table.
    pub fn first_uncovered_year_start(&self) -> Option<NaiveDate> {
        let last_end = self.rows.iter().map(|r| r.date_end).max()?;
        NaiveDate::from_ymd_opt(last_end.year() + 1, 1, 1)
    }

    /// Finds the row covering `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use ij_engine::models::{RateLookup, RateRow, RateTable};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    /// let rate = Decimal::new(6352, 2);
    /// let table = RateTable::new(vec![RateRow {
    ///     date_start: d(2024, 1, 1),
    ///     date_end: d(2024, 12, 31),
    ///     taux_a1: rate, taux_a2: rate, taux_a3: rate,
    ///     taux_b1: rate, taux_b2: rate, taux_b3: rate,
    ///     taux_c1: rate, taux_c2: rate, taux_c3: rate,
    /// }]).unwrap();
    ///
    /// assert!(matches!(table.lookup(d(2024, 7, 1)), RateLookup::Found(_)));
    /// assert_eq!(table.lookup(d(2025, 3, 1)), RateLookup::BeyondCoverage);
    /// assert_eq!(table.lookup(d(2023, 3, 1)), RateLookup::Uncovered);
    /// ```
    pub fn lookup(&self, date: NaiveDate) -> RateLookup<'_> {
        // Rows are sorted and disjoint: the candidate is the last row starting on or before date.
        let idx = self.rows.partition_point(|r| r.date_start <= date);
        if idx > 0 && self.rows[idx - 1].covers(date) {
            return RateLookup::Found(&self.rows[idx - 1]);
        }
        match self.first_uncovered_year_start() {
            Some(boundary) if date >= boundary => RateLookup::BeyondCoverage,
            None => RateLookup::BeyondCoverage,
            _ => RateLookup::Uncovered,
        }
    }

    /// Returns the table rate for a date, class and tier, or `None` when no
    /// row covers the date.
    pub fn rate_for(&self, date: NaiveDate, classe: Classe, tier: RateTier) -> Option<Decimal> {
        match self.lookup(date) {
            RateLookup::Found(row) => Some(row.rate(classe, tier)),
            _ => None,
        }
    }
}
