//! Calculation result models for the IJ entitlement engine.
//!
//! This module contains the [`CalculationResult`] type and its associated structures
//! that capture all outputs of an indemnity calculation: per-stoppage waiting-period
//! outcomes, the rate breakdown, totals, and the audit trace.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{RateTier, StoppageId};

/// Where a daily rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// A row of the rate table.
    Table,
    /// The `(k × PASS) / divisor` fallback for years not yet published.
    PassFormula,
}

/// One contiguous run of paid days sharing year, tier and rate.
///
/// # Example
///
/// ```
/// use ij_engine::models::{RateBreakdownEntry, RateSource, RateTier};
/// use rust_decimal::Decimal;
/// use chrono::NaiveDate;
/// use std::str::FromStr;
///
/// let entry = RateBreakdownEntry {
///     start_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     days: 12,
///     year: 2024,
///     tier: RateTier::Full,
///     base_rate: Decimal::from_str("63.52").unwrap(),
///     rate: Decimal::from_str("63.52").unwrap(),
///     rate_source: RateSource::Table,
///     amount: Decimal::from_str("762.24").unwrap(),
/// };
/// assert_eq!(entry.days, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBreakdownEntry {
    /// First paid day of the run.
    pub start_date: NaiveDate,
    /// Last paid day of the run (inclusive).
    pub end_date: NaiveDate,
    /// Number of paid days in the run.
    pub days: u32,
    /// Calendar year of the run.
    pub year: i32,
    /// The tier applied to every day of the run.
    pub tier: RateTier,
    /// The table or formula rate before any pre-existing-condition factor.
    pub base_rate: Decimal,
    /// The daily rate actually applied.
    pub rate: Decimal,
    /// Where `base_rate` came from.
    pub rate_source: RateSource,
    /// `days × rate × participation / 100`, unrounded.
    pub amount: Decimal,
}

/// Paid days falling in one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDays {
    /// The calendar year.
    pub year: i32,
    /// Paid days in that year.
    pub days: u32,
}

/// The outcome for one (possibly merged) stoppage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppageResult {
    /// Identifier of the stoppage (first member when merged).
    pub id: StoppageId,
    /// First day of the stoppage.
    pub start_date: NaiveDate,
    /// Last day of the stoppage.
    pub end_date: NaiveDate,
    /// Input positions folded into this stoppage; absent when nothing was merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_indices: Option<Vec<usize>>,
    /// Days covered by the stoppage.
    pub duration_days: u32,
    /// Non-payable waiting days counted within this stoppage.
    pub decompte_days: u32,
    /// Running cumulative day total after this stoppage.
    pub cumulative_days: u32,
    /// Whether the stoppage was treated as a relapse.
    pub is_relapse: bool,
    /// The stoppage this relapse extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relapse_of: Option<StoppageId>,
    /// The date rights open, or `None` if the threshold was not reached.
    pub date_effet: Option<NaiveDate>,
    /// The declaration date carried from the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration_date: Option<NaiveDate>,
    /// Days paid for this stoppage.
    pub payable_days: u32,
    /// Payable days dropped because the benefit cap was reached.
    pub capped_days: u32,
    /// Paid days per calendar year.
    pub year_split: Vec<YearDays>,
    /// The rate runs making up the payment.
    pub rate_breakdown: Vec<RateBreakdownEntry>,
    /// Sum of the breakdown amounts, unrounded.
    pub subtotal_amount: Decimal,
}

/// Aggregated totals for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndemnityTotals {
    /// The grand total rounded to two decimal places.
    pub total_amount: Decimal,
    /// The grand total before presentation rounding.
    pub unrounded_amount: Decimal,
    /// Total paid days over all stoppages.
    pub total_payable_days: u32,
    /// Prior cumulative days plus every stoppage duration.
    pub total_cumulative_days: u32,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// The complete audit trace for a calculation.
///
/// Records every decision made during the calculation for review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Returns the number the next step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Returns true if a warning with `code` was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// The complete result of an indemnity calculation.
///
/// The structure holds no timestamps or generated ids: running the same
/// calculation twice yields equal results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// Claimant age on the calculation date.
    pub claimant_age_at_calc: u32,
    /// Aggregated totals.
    pub totals: IndemnityTotals,
    /// One entry per (merged) stoppage, in chronological order.
    pub stoppages: Vec<StoppageResult>,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}
