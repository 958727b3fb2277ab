//! Rate tier assignment.
//!
//! The tier of a paid day depends on the claimant's age band and on how many
//! days have been paid before it. Each age band lists successive windows
//! (e.g. 365 days at the full rate, then 365 reduced, then 365 further
//! reduced); days past the last window are not paid.
//!
//! Under [`TierCounting::Anniversary`] a window of whole years (365, 730...
//! days) holds as many paid days as the calendar years it spans from the
//! first paid day, so a window starting on Jan 1st of a leap year ends on
//! Dec 31st.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{AgeBand, CalculationRules, TierCounting, TierWindow};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, RateTier};

use super::date_arithmetic::{YearSegment, add_years, inclusive_days, plus_days};

/// Warning raised when paid days run past the last tier window.
pub const BENEFIT_CAP_REACHED: &str = "BENEFIT_CAP_REACHED";

/// A run of consecutive paid days within one year at one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRun {
    /// First day of the run.
    pub start: NaiveDate,
    /// Last day of the run (inclusive).
    pub end: NaiveDate,
    /// Number of days in the run.
    pub days: u32,
    /// Calendar year of the run.
    pub year: i32,
    /// The tier paid for the run.
    pub tier: RateTier,
}

/// Tier runs for one stoppage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAssignment {
    /// Runs in date order.
    pub runs: Vec<TierRun>,
    /// Days that fit within a tier window.
    pub paid_days: u32,
    /// Days dropped past the last window.
    pub capped_days: u32,
    /// Paid-day counter after this stoppage.
    pub paid_days_after: u32,
    /// Set when some days were dropped.
    pub warning: Option<AuditWarning>,
    /// The audit step recording the assignment.
    pub audit_step: AuditStep,
}

/// Returns the age band for `age`, or a `CalculationError` when the rule set
/// has none.
pub fn select_age_band(rules: &CalculationRules, age: u32) -> EngineResult<&AgeBand> {
    rules.age_band(age).ok_or_else(|| EngineError::CalculationError {
        message: format!("no age band configured for age {}", age),
    })
}

/// Returns the tier of the paid day at `position` (1-based) and the last
/// position of its window, or `None` past the last window.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::tier_at_position;
/// use ij_engine::config::{AgeBand, TierWindow};
/// use ij_engine::models::RateTier;
///
/// let band = AgeBand {
///     min_age: 62,
///     max_age: Some(69),
///     windows: vec![
///         TierWindow { tier: RateTier::Full, days: 365 },
///         TierWindow { tier: RateTier::Reduced, days: 365 },
///     ],
/// };
/// assert_eq!(tier_at_position(&band, 365), Some((RateTier::Full, 365)));
/// assert_eq!(tier_at_position(&band, 366), Some((RateTier::Reduced, 730)));
/// assert_eq!(tier_at_position(&band, 731), None);
/// ```
pub fn tier_at_position(band: &AgeBand, position: u32) -> Option<(RateTier, u32)> {
    let mut upper = 0u32;
    for window in &band.windows {
        upper = upper.saturating_add(window.days);
        if position <= upper && window.days > 0 {
            return Some((window.tier, upper));
        }
    }
    None
}

/// Returns the band whose windows count paid days the way `counting` asks.
///
/// `anchor` is the first paid day of the claim. With
/// [`TierCounting::PaidDays`] the band is returned unchanged; with
/// [`TierCounting::Anniversary`] every window of whole years is resized to
/// the calendar length of those years, taken in order from `anchor`.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::anniversary_band;
/// use ij_engine::config::{AgeBand, TierCounting, TierWindow};
/// use ij_engine::models::RateTier;
/// use chrono::NaiveDate;
///
/// let band = AgeBand {
///     min_age: 62,
///     max_age: Some(69),
///     windows: vec![
///         TierWindow { tier: RateTier::Full, days: 365 },
///         TierWindow { tier: RateTier::Reduced, days: 365 },
///     ],
/// };
/// let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let resized = anniversary_band(&band, anchor, TierCounting::Anniversary);
/// assert_eq!(resized.windows[0].days, 366);
/// assert_eq!(resized.windows[1].days, 365);
/// ```
pub fn anniversary_band(band: &AgeBand, anchor: NaiveDate, counting: TierCounting) -> AgeBand {
    if counting == TierCounting::PaidDays {
        return band.clone();
    }
    let mut cursor = anchor;
    let windows = band
        .windows
        .iter()
        .map(|window| {
            let days = if window.days > 0 && window.days % 365 == 0 {
                let next = add_years(cursor, window.days / 365);
                inclusive_days(cursor, next) - 1
            } else {
                window.days
            };
            cursor = plus_days(cursor, days);
            TierWindow {
                tier: window.tier,
                days,
            }
        })
        .collect();
    AgeBand {
        min_age: band.min_age,
        max_age: band.max_age,
        windows,
    }
}

/// Splits paid year segments into tier runs.
///
/// # Arguments
///
/// * `segments` - Paid days of the stoppage, by year, in date order
/// * `band` - The age band at the stoppage's date d'effet
/// * `paid_days_before` - Days already paid, by prior claims and earlier stoppages
/// * `step_number` - The step number for audit trail sequencing
pub fn assign_tiers(
    segments: &[YearSegment],
    band: &AgeBand,
    paid_days_before: u32,
    step_number: u32,
) -> TierAssignment {
    let mut runs = Vec::new();
    let mut paid = paid_days_before;
    let mut capped_days = 0u32;

    for segment in segments {
        let mut cursor = segment.start;
        let mut remaining = segment.days;
        while remaining > 0 {
            match tier_at_position(band, paid + 1) {
                Some((tier, window_last)) => {
                    let take = remaining.min(window_last - paid);
                    let end = plus_days(cursor, take - 1);
                    runs.push(TierRun {
                        start: cursor,
                        end,
                        days: take,
                        year: segment.year,
                        tier,
                    });
                    paid += take;
                    remaining -= take;
                    cursor = plus_days(end, 1);
                }
                None => {
                    capped_days += remaining;
                    remaining = 0;
                }
            }
        }
    }

    let paid_days = paid - paid_days_before;
    let warning = (capped_days > 0).then(|| {
        tracing::warn!(capped_days, limit = band.total_days(), "Benefit cap reached");
        AuditWarning::new(
            BENEFIT_CAP_REACHED,
            format!(
                "{} days exceed the {}-day limit of the age band and are not paid",
                capped_days,
                band.total_days()
            ),
            "medium",
        )
    });

    let reasoning = if runs.is_empty() && capped_days == 0 {
        "No payable days to assign".to_string()
    } else {
        let tiers: Vec<String> = runs
            .iter()
            .map(|r| format!("{} days at tier {}", r.days, r.tier))
            .collect();
        format!(
            "Paid days {} to {}: {}{}",
            paid_days_before + 1,
            paid,
            if tiers.is_empty() { "none".to_string() } else { tiers.join(", ") },
            if capped_days > 0 {
                format!("; {} days beyond the limit", capped_days)
            } else {
                String::new()
            }
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "rate_tier".to_string(),
        rule_name: "Rate Tier Assignment".to_string(),
        input: serde_json::json!({
            "min_age": band.min_age,
            "max_age": band.max_age,
            "paid_days_before": paid_days_before,
            "segment_days": segments.iter().map(|s| s.days).sum::<u32>(),
        }),
        output: serde_json::json!({
            "runs": runs.iter().map(|r| serde_json::json!({
                "start": r.start.to_string(),
                "end": r.end.to_string(),
                "days": r.days,
                "tier": r.tier.number(),
            })).collect::<Vec<_>>(),
            "paid_days": paid_days,
            "capped_days": capped_days,
        }),
        reasoning,
    };

    TierAssignment {
        runs,
        paid_days,
        capped_days,
        paid_days_after: paid,
        warning,
        audit_step,
    }
}
