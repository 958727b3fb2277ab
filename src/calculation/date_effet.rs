//! Waiting-period resolution ("date d'effet").
//!
//! Walks the merged stoppages in order and decides, for each one, whether it
//! is a relapse, how many waiting days it consumes, and on which date payable
//! rights open. Fresh pathologies wait for a cumulative threshold (90 days by
//! default) shared across stoppages; relapses wait for their own shorter
//! threshold (15 days) counted from their own start.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::WaitingPeriodRules;
use crate::models::{AuditStep, AuditWarning, StoppageId};

use super::date_arithmetic::add_years;
use super::prolongation::MergedStoppage;

/// Warning raised when a stoppage flagged as a relapse has no predecessor.
pub const AMBIGUOUS_RELAPSE_LINK: &str = "AMBIGUOUS_RELAPSE_LINK";

/// Why a stoppage was, or was not, treated as a relapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelapseClassification {
    /// Fresh pathology.
    Fresh,
    /// Flagged as a relapse on the record.
    Explicit,
    /// Unflagged, but starts within the relapse window of the previous stoppage.
    Inferred,
    /// Flagged as a relapse with nothing to relapse from; evaluated as fresh.
    Ambiguous,
}

impl RelapseClassification {
    /// Returns true when the relapse threshold applies.
    pub fn is_relapse(self) -> bool {
        matches!(self, Self::Explicit | Self::Inferred)
    }
}

/// A merged stoppage enriched with its waiting-period outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStoppage {
    /// The merged stoppage.
    pub stoppage: MergedStoppage,
    /// How the relapse flag was resolved.
    pub classification: RelapseClassification,
    /// The stoppage this relapse extends.
    pub relapse_of: Option<StoppageId>,
    /// The date rights open, or `None` if the threshold is not reached.
    pub date_effet: Option<NaiveDate>,
    /// Waiting days consumed within this stoppage.
    pub decompte_days: u32,
    /// Running cumulative day total after this stoppage.
    pub cumulative_days: u32,
}

impl ResolvedStoppage {
    /// Returns true if the stoppage was treated as a relapse.
    pub fn is_relapse(&self) -> bool {
        self.classification.is_relapse()
    }
}

/// The waiting-period outcome for a whole stoppage list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEffetResolution {
    /// One entry per merged stoppage, in input order.
    pub stoppages: Vec<ResolvedStoppage>,
    /// One audit step per stoppage.
    pub audit_steps: Vec<AuditStep>,
    /// Warnings raised while resolving.
    pub warnings: Vec<AuditWarning>,
}

/// Counters carried from one stoppage to the next.
#[derive(Debug, Clone, Copy)]
struct WaitingCounters {
    fresh_days: u32,
    cumulative_days: u32,
    rights_open: bool,
}

/// Resolves the date d'effet of every merged stoppage.
///
/// `previous_cumul_days` seeds both the fresh-pathology counter and the
/// cumulative total. Relapse durations feed the cumulative total only.
/// Once rights are open, a later stoppage that is not a relapse is paid
/// from its first day without a new threshold evaluation.
///
/// # Arguments
///
/// * `stoppages` - Merged stoppages in chronological order
/// * `previous_cumul_days` - Waiting days accumulated by prior claims
/// * `rules` - Thresholds and the relapse inference window
/// * `first_step_number` - Step number of the first emitted audit step
///
/// # Example
///
/// ```
/// use ij_engine::calculation::{merge_prolongations, resolve_date_effets, HolidayCalendar};
/// use ij_engine::config::WaitingPeriodRules;
/// use ij_engine::models::Stoppage;
/// use chrono::NaiveDate;
///
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let merged = merge_prolongations(
///     &[Stoppage::new("a", d(2024, 1, 1), d(2024, 4, 30))],
///     &HolidayCalendar::weekends_only(),
/// );
/// let resolution = resolve_date_effets(&merged, 0, &WaitingPeriodRules::default(), 1);
///
/// // 90th day of a stoppage starting on Jan 1st in a leap year
/// assert_eq!(resolution.stoppages[0].date_effet, Some(d(2024, 3, 30)));
/// assert_eq!(resolution.stoppages[0].decompte_days, 89);
/// ```
pub fn resolve_date_effets(
    stoppages: &[MergedStoppage],
    previous_cumul_days: u32,
    rules: &WaitingPeriodRules,
    first_step_number: u32,
) -> DateEffetResolution {
    let mut counters = WaitingCounters {
        fresh_days: previous_cumul_days,
        cumulative_days: previous_cumul_days,
        rights_open: previous_cumul_days >= rules.fresh_threshold_days,
    };
    let mut resolved = Vec::with_capacity(stoppages.len());
    let mut audit_steps = Vec::with_capacity(stoppages.len());
    let mut warnings = Vec::new();

    for (position, stoppage) in stoppages.iter().enumerate() {
        let previous = position.checked_sub(1).map(|p| &stoppages[p]);
        let classification = classify(stoppage, previous, counters.rights_open, rules);

        if classification == RelapseClassification::Ambiguous {
            tracing::warn!(
                stoppage = %stoppage.id,
                "Relapse flag without a previous stoppage, evaluating as a new pathology"
            );
            warnings.push(AuditWarning::new(
                AMBIGUOUS_RELAPSE_LINK,
                format!(
                    "Stoppage {} is flagged as a relapse but has no previous stoppage; \
                     the {}-day threshold was applied",
                    stoppage.id, rules.fresh_threshold_days
                ),
                "medium",
            ));
        }

        let fresh_before = counters.fresh_days;
        let duration = stoppage.duration_days();
        let (date_effet, decompte_days, reasoning) = if let Some(forced) = stoppage.forced_rights_date {
            (
                Some(forced),
                stoppage.days_before(forced),
                format!("Rights opening forced to {} on the record", forced),
            )
        } else if classification.is_relapse() {
            relapse_date_effet(stoppage, rules.relapse_threshold_days)
        } else if counters.rights_open {
            (
                Some(stoppage.start_date),
                0,
                "Rights already open for this pathology, payable from the first day".to_string(),
            )
        } else {
            fresh_date_effet(stoppage, fresh_before, rules.fresh_threshold_days)
        };

        if !classification.is_relapse() {
            counters.fresh_days = counters.fresh_days.saturating_add(duration);
        }
        counters.cumulative_days = counters.cumulative_days.saturating_add(duration);
        counters.rights_open |= date_effet.is_some();

        let relapse_of = if classification.is_relapse() {
            previous.map(|p| p.id.clone())
        } else {
            None
        };

        audit_steps.push(AuditStep {
            step_number: first_step_number + position as u32,
            rule_id: "date_effet_resolution".to_string(),
            rule_name: "Waiting Period Resolution".to_string(),
            input: serde_json::json!({
                "stoppage_id": stoppage.id.as_str(),
                "start_date": stoppage.start_date.to_string(),
                "end_date": stoppage.end_date.to_string(),
                "duration_days": duration,
                "relapse_flag": stoppage.relapse,
                "fresh_days_before": fresh_before,
            }),
            output: serde_json::json!({
                "classification": classification,
                "relapse_of": relapse_of.as_ref().map(StoppageId::as_str),
                "date_effet": date_effet.map(|d| d.to_string()),
                "decompte_days": decompte_days,
                "cumulative_days": counters.cumulative_days,
            }),
            reasoning,
        });

        tracing::debug!(
            stoppage = %stoppage.id,
            ?classification,
            ?date_effet,
            decompte_days,
            "Resolved waiting period"
        );

        resolved.push(ResolvedStoppage {
            stoppage: stoppage.clone(),
            classification,
            relapse_of,
            date_effet,
            decompte_days,
            cumulative_days: counters.cumulative_days,
        });
    }

    DateEffetResolution {
        stoppages: resolved,
        audit_steps,
        warnings,
    }
}

fn classify(
    stoppage: &MergedStoppage,
    previous: Option<&MergedStoppage>,
    rights_open: bool,
    rules: &WaitingPeriodRules,
) -> RelapseClassification {
    match (stoppage.relapse, previous) {
        (Some(true), Some(_)) => RelapseClassification::Explicit,
        (Some(true), None) => RelapseClassification::Ambiguous,
        (Some(false), _) | (None, None) => RelapseClassification::Fresh,
        (None, Some(previous)) => {
            let window_end = add_years(previous.end_date, rules.relapse_window_years).pred_opt();
            let within_window = window_end.is_some_and(|last| stoppage.start_date <= last);
            if rights_open && within_window {
                RelapseClassification::Inferred
            } else {
                RelapseClassification::Fresh
            }
        }
    }
}

fn relapse_date_effet(stoppage: &MergedStoppage, threshold: u32) -> (Option<NaiveDate>, u32, String) {
    match stoppage.nth_day(threshold) {
        Some(date) => (
            Some(date),
            threshold.saturating_sub(1),
            format!("Relapse reaches its {}-day threshold on {}", threshold, date),
        ),
        None => (
            None,
            0,
            format!(
                "Relapse lasts {} days, shorter than its {}-day threshold",
                stoppage.duration_days(),
                threshold
            ),
        ),
    }
}

fn fresh_date_effet(
    stoppage: &MergedStoppage,
    fresh_before: u32,
    threshold: u32,
) -> (Option<NaiveDate>, u32, String) {
    let needed = threshold.saturating_sub(fresh_before).max(1);
    match stoppage.nth_day(needed) {
        Some(date) => (
            Some(date),
            needed - 1,
            format!(
                "{} days accumulated before, day {} of this stoppage completes the {}-day threshold",
                fresh_before, needed, threshold
            ),
        ),
        None => (
            None,
            stoppage.duration_days(),
            format!(
                "{} + {} days stays below the {}-day threshold",
                fresh_before,
                stoppage.duration_days(),
                threshold
            ),
        ),
    }
}
