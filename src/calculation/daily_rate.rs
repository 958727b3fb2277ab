//! Daily rate resolution.
//!
//! Rates come from the rate table. For calendar years the table does not
//! reach yet, the rate is derived from the annual PASS value:
//! `k × PASS / divisor`. A date inside or before covered history with no row
//! is an error, never a fallback.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PassFallback;
use crate::error::{EngineError, EngineResult};
use crate::models::{Classe, RateLookup, RateSource, RateTable, RateTier};

/// Warning raised when a rate was derived from the PASS formula.
pub const PASS_FORMULA_FALLBACK: &str = "PASS_FORMULA_FALLBACK";

/// A resolved daily rate and how long it stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRate {
    /// The daily rate before any participation or pre-existing factor.
    pub rate: Decimal,
    /// Where the rate came from.
    pub source: RateSource,
    /// Last date the same rate applies (end of the row, or of the year for
    /// the PASS formula).
    pub valid_until: NaiveDate,
}

/// Computes `k × PASS[year] / divisor`, or `None` when the year's PASS
/// value or the class coefficients are not configured.
///
/// The result is not rounded.
pub fn pass_formula_rate(
    year: i32,
    classe: Classe,
    tier: RateTier,
    fallback: &PassFallback,
) -> Option<Decimal> {
    let pass = fallback.annual_values.get(&year)?;
    let k = fallback.coefficients.get(&classe)?.for_tier(tier);
    (k * *pass).checked_div(fallback.divisor)
}

/// Resolves the daily rate for a date, class and tier.
///
/// # Errors
///
/// Returns [`EngineError::RateNotFound`] when no row covers a date within or
/// before covered history, or when the PASS formula lacks data for the year.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::resolve_daily_rate;
/// use ij_engine::config::ConfigLoader;
/// use ij_engine::models::{Classe, RateSource, RateTier};
/// use chrono::NaiveDate;
///
/// let config = ConfigLoader::load("./config/ij").unwrap();
/// let rate = resolve_daily_rate(
///     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
///     Classe::A,
///     RateTier::Full,
///     config.rate_table(),
///     &config.rules().pass_fallback,
/// ).unwrap();
///
/// assert_eq!(rate.source, RateSource::Table);
/// assert_eq!(rate.rate.to_string(), "63.52");
/// ```
pub fn resolve_daily_rate(
    date: NaiveDate,
    classe: Classe,
    tier: RateTier,
    table: &RateTable,
    fallback: &PassFallback,
) -> EngineResult<DailyRate> {
    let not_found = || EngineError::RateNotFound { classe, tier, date };

    match table.lookup(date) {
        RateLookup::Found(row) => Ok(DailyRate {
            rate: row.rate(classe, tier),
            source: RateSource::Table,
            valid_until: row.date_end,
        }),
        RateLookup::BeyondCoverage => {
            let rate = pass_formula_rate(date.year(), classe, tier, fallback).ok_or_else(not_found)?;
            let valid_until = NaiveDate::from_ymd_opt(date.year(), 12, 31).ok_or_else(not_found)?;
            tracing::debug!(%date, %classe, %tier, %rate, "Rate derived from PASS formula");
            Ok(DailyRate {
                rate,
                source: RateSource::PassFormula,
                valid_until,
            })
        }
        RateLookup::Uncovered => Err(not_found()),
    }
}
