//! Amount computation and aggregation.
//!
//! Tier runs are priced into [`RateBreakdownEntry`] values, splitting a run
//! wherever its rate row ends. Amounts stay unrounded until the grand total,
//! which is rounded to cents half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::PassFallback;
use crate::error::EngineResult;
use crate::models::{
    AuditStep, AuditWarning, Classe, IndemnityTotals, RateBreakdownEntry, RateSource, RateTable,
    StoppageId, StoppageResult,
};

use super::daily_rate::{PASS_FORMULA_FALLBACK, resolve_daily_rate};
use super::date_arithmetic::{inclusive_days, plus_days};
use super::pre_existing::RateFactor;
use super::rate_tier::TierRun;

/// The priced breakdown of one stoppage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedStoppage {
    /// Breakdown entries in date order.
    pub entries: Vec<RateBreakdownEntry>,
    /// Sum of entry amounts, unrounded.
    pub subtotal: Decimal,
    /// Set when at least one rate came from the PASS formula.
    pub warning: Option<AuditWarning>,
    /// The audit step recording the pricing.
    pub audit_step: AuditStep,
}

/// Pricing inputs shared by every run of a stoppage.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    /// The claimant's class.
    pub classe: Classe,
    /// Participation percentage (100 for full cover).
    pub participation: Decimal,
    /// Pre-existing condition factor of the stoppage.
    pub factor: RateFactor,
    /// The rate table.
    pub table: &'a RateTable,
    /// The formula for years past the table.
    pub fallback: &'a PassFallback,
}

/// Rounds an amount to cents, half away from zero.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::round_for_presentation;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_for_presentation(Decimal::from_str("10.005").unwrap()).to_string(), "10.01");
/// assert_eq!(round_for_presentation(Decimal::from_str("10.004").unwrap()).to_string(), "10.00");
/// ```
pub fn round_for_presentation(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prices tier runs into breakdown entries.
///
/// Each entry amount is `days × rate × participation / 100`, where `rate` is
/// the table or formula rate scaled by the pre-existing condition factor.
///
/// # Errors
///
/// Propagates [`crate::error::EngineError::RateNotFound`] from rate resolution.
pub fn price_tier_runs(
    stoppage_id: &StoppageId,
    runs: &[TierRun],
    pricing: &PricingContext<'_>,
    step_number: u32,
) -> EngineResult<PricedStoppage> {
    let mut entries = Vec::new();

    for run in runs {
        let mut cursor = run.start;
        while cursor <= run.end {
            let daily = resolve_daily_rate(cursor, pricing.classe, run.tier, pricing.table, pricing.fallback)?;
            let end = daily.valid_until.min(run.end);
            let days = inclusive_days(cursor, end);
            let rate = pricing.factor.apply(daily.rate);
            let amount = Decimal::from(days) * rate * pricing.participation / Decimal::ONE_HUNDRED;
            entries.push(RateBreakdownEntry {
                start_date: cursor,
                end_date: end,
                days,
                year: run.year,
                tier: run.tier,
                base_rate: daily.rate,
                rate,
                rate_source: daily.source,
                amount,
            });
            cursor = plus_days(end, 1);
        }
    }

    let subtotal: Decimal = entries.iter().map(|e| e.amount).sum();
    let formula_years: Vec<i32> = entries
        .iter()
        .filter(|e| e.rate_source == RateSource::PassFormula)
        .map(|e| e.year)
        .collect();

    let warning = (!formula_years.is_empty()).then(|| {
        tracing::warn!(stoppage = %stoppage_id, years = ?formula_years, "Rates derived from PASS formula");
        AuditWarning::new(
            PASS_FORMULA_FALLBACK,
            format!(
                "Stoppage {}: no published rate row, PASS formula used for {:?}",
                stoppage_id, formula_years
            ),
            "low",
        )
    });

    let audit_step = AuditStep {
        step_number,
        rule_id: "amount".to_string(),
        rule_name: "Amount Calculation".to_string(),
        input: serde_json::json!({
            "stoppage_id": stoppage_id.as_str(),
            "classe": pricing.classe,
            "participation": pricing.participation.normalize().to_string(),
            "factor": format!("{}/{}", pricing.factor.numerator, pricing.factor.denominator),
        }),
        output: serde_json::json!({
            "entries": entries.len(),
            "subtotal": subtotal.normalize().to_string(),
        }),
        reasoning: entries
            .iter()
            .map(|e| format!("{} days × {} ({})", e.days, e.rate.normalize(), e.year))
            .collect::<Vec<_>>()
            .join(" + "),
    };

    Ok(PricedStoppage {
        entries,
        subtotal,
        warning,
        audit_step,
    })
}

/// Sums per-stoppage results into the calculation totals.
///
/// `total_cumulative_days` counts `previous_cumul_days` plus every stoppage
/// duration; only the grand total is rounded.
pub fn aggregate_totals(stoppages: &[StoppageResult], previous_cumul_days: u32) -> IndemnityTotals {
    let unrounded_amount: Decimal = stoppages.iter().map(|s| s.subtotal_amount).sum();
    IndemnityTotals {
        total_amount: round_for_presentation(unrounded_amount),
        unrounded_amount,
        total_payable_days: stoppages.iter().map(|s| s.payable_days).sum(),
        total_cumulative_days: previous_cumul_days
            + stoppages.iter().map(|s| s.duration_days).sum::<u32>(),
    }
}
