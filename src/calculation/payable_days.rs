//! Payable window computation.
//!
//! Turns a resolved stoppage into the stoppage days actually paid, split by
//! calendar year so each year can be priced with its own rate row.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::{AttestationRules, CalculationRules, SinglePointRule};
use crate::models::{AuditStep, AuditWarning, YearDays};

use super::date_arithmetic::{DateSpan, YearSegment, last_day_of_month, split_by_calendar_year};
use super::date_effet::ResolvedStoppage;

/// Warning raised when a stoppage is explicitly not medically validated.
pub const MEDICAL_VALIDATION_PENDING: &str = "MEDICAL_VALIDATION_PENDING";

/// The paid part of one stoppage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableDaysResult {
    /// `[date_effet, min(end, cap)]`, or `None` when rights are not open.
    pub window: Option<DateSpan>,
    /// Paid stoppage days, split by calendar year, in date order.
    pub segments: Vec<YearSegment>,
    /// Total paid days.
    pub payable_days: u32,
    /// Paid days per calendar year.
    pub year_split: Vec<YearDays>,
    /// Set when payment is withheld pending medical validation.
    pub warning: Option<AuditWarning>,
    /// The audit step recording the computation.
    pub audit_step: AuditStep,
}

/// Returns the date beyond which payment is not authorized yet.
///
/// From `month_end_extension_day` on, the attestation covers the rest of its
/// month.
///
/// # Example
///
/// ```
/// use ij_engine::calculation::attestation_cap;
/// use ij_engine::config::AttestationRules;
/// use chrono::NaiveDate;
///
/// let rules = AttestationRules::default();
/// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
///
/// assert_eq!(attestation_cap(Some(d(3, 15)), &rules), Some(d(3, 15)));
/// assert_eq!(attestation_cap(Some(d(2, 27)), &rules), Some(d(2, 29)));
/// assert_eq!(attestation_cap(None, &rules), None);
/// ```
pub fn attestation_cap(attestation_date: Option<NaiveDate>, rules: &AttestationRules) -> Option<NaiveDate> {
    let date = attestation_date?;
    match rules.month_end_extension_day {
        Some(day) if date.day() >= day => Some(last_day_of_month(date)),
        _ => Some(date),
    }
}

/// Computes the payable days of a resolved stoppage.
///
/// Only days inside member spans are paid, from `date_effet` through the
/// stoppage end or the attestation cap, whichever comes first. A window
/// reduced to one day pays nothing under [`SinglePointRule::Exclusive`].
///
/// # Arguments
///
/// * `stoppage` - The stoppage with its waiting-period outcome
/// * `attestation_date` - The claimant's attestation date, if any
/// * `rules` - Attestation extension and single-point settings
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_payable_days(
    stoppage: &ResolvedStoppage,
    attestation_date: Option<NaiveDate>,
    rules: &CalculationRules,
    step_number: u32,
) -> PayableDaysResult {
    let merged = &stoppage.stoppage;
    let cap = attestation_cap(attestation_date, &rules.attestation);
    let window_end = cap.map_or(merged.end_date, |cap| cap.min(merged.end_date));
    let window = stoppage
        .date_effet
        .map(|date_effet| DateSpan::new(date_effet, window_end));

    let mut warning = None;
    let (segments, reasoning) = match window {
        None => (vec![], "Rights are not open for this stoppage".to_string()),
        Some(_) if merged.medically_validated == Some(false) => {
            tracing::warn!(stoppage = %merged.id, "Payment withheld pending medical validation");
            warning = Some(AuditWarning::new(
                MEDICAL_VALIDATION_PENDING,
                format!("Stoppage {} is not medically validated; no day is paid", merged.id),
                "high",
            ));
            (vec![], "Medical validation refused or pending".to_string())
        }
        Some(span) if span.start > span.end => (
            vec![],
            format!("Date d'effet {} is after the window end {}", span.start, span.end),
        ),
        Some(span) if span.start == span.end && rules.single_point_rule == SinglePointRule::Exclusive => (
            vec![],
            format!(
                "Date d'effet equals the window end {}, a single-point window pays nothing",
                span.end
            ),
        ),
        Some(span) => {
            let segments: Vec<YearSegment> = merged
                .spans_within(span.start, span.end)
                .iter()
                .flat_map(|part| split_by_calendar_year(part.start, part.end))
                .collect();
            let days: u32 = segments.iter().map(|s| s.days).sum();
            let capped_by = match cap {
                Some(cap) if cap < merged.end_date => format!(", capped by attestation at {}", cap),
                _ => String::new(),
            };
            (
                segments,
                format!("{} days payable from {} to {}{}", days, span.start, span.end, capped_by),
            )
        }
    };

    let payable_days: u32 = segments.iter().map(|s| s.days).sum();
    let year_split = year_split(segments.iter().map(|s| (s.year, s.days)));

    let audit_step = AuditStep {
        step_number,
        rule_id: "payable_days".to_string(),
        rule_name: "Payable Days".to_string(),
        input: serde_json::json!({
            "stoppage_id": merged.id.as_str(),
            "date_effet": stoppage.date_effet.map(|d| d.to_string()),
            "end_date": merged.end_date.to_string(),
            "attestation_date": attestation_date.map(|d| d.to_string()),
            "attestation_cap": cap.map(|d| d.to_string()),
            "single_point_rule": rules.single_point_rule,
        }),
        output: serde_json::json!({
            "payable_days": payable_days,
            "year_split": year_split,
        }),
        reasoning,
    };

    PayableDaysResult {
        window,
        segments,
        payable_days,
        year_split,
        warning,
        audit_step,
    }
}

/// Collapses `(year, days)` parts in date order into per-year totals.
pub(crate) fn year_split(parts: impl IntoIterator<Item = (i32, u32)>) -> Vec<YearDays> {
    let mut split: Vec<YearDays> = Vec::new();
    for (year, days) in parts {
        match split.last_mut() {
            Some(last) if last.year == year => last.days += days,
            _ => split.push(YearDays { year, days }),
        }
    }
    split
}
