//! The calculation entry point.
//!
//! [`calculate`] validates its input and runs the stages in order:
//! prolongation merging, waiting-period resolution, payable days, rate
//! tiers, pricing and aggregation. Every stage returns new values; nothing
//! is shared between calls.

use crate::config::CalculationRules;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, CalculationResult, ClaimantContext, RateTable, Stoppage,
    StoppageResult,
};

use super::amount::{PricingContext, aggregate_totals, price_tier_runs};
use super::date_effet::{ResolvedStoppage, resolve_date_effets};
use super::holidays::HolidayCalendar;
use super::payable_days::{calculate_payable_days, year_split};
use super::pre_existing::pre_existing_factor;
use super::prolongation::{MergedStoppage, merge_prolongations};
use super::rate_tier::{anniversary_band, assign_tiers, select_age_band};

/// Computes the indemnity of a claimant for a list of stoppages.
///
/// Stoppages may be given in any order; they are processed chronologically
/// and `merged_indices` refer to positions in `stoppages` as given.
///
/// # Errors
///
/// - `MalformedInput` for an invalid claimant context
/// - `InvalidDateRange` for a stoppage ending before it starts
/// - `MalformedInput` for two stoppages sharing a day
/// - `RateNotFound` when a paid day has no rate
/// - `CalculationError` when the rules have no age band for the claimant
///
/// # Example
///
/// ```
/// use ij_engine::calculation::calculate;
/// use ij_engine::config::ConfigLoader;
/// use ij_engine::models::{ClaimantContext, Classe, Statut, Stoppage};
/// use chrono::NaiveDate;
///
/// let config = ConfigLoader::load("./config/ij").unwrap();
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let claimant = ClaimantContext {
///     birth_date: d(1980, 4, 12),
///     affiliation_date: Some(d(2010, 1, 1)),
///     statut: Statut::Medecin,
///     classe: Classe::A,
///     option: None,
///     calculation_date: d(2024, 12, 31),
///     attestation_date: None,
///     previous_cumul_days: 0,
///     previous_paid_days: 0,
///     pre_existing_condition: false,
/// };
/// let stoppages = vec![Stoppage::new("arret_1", d(2024, 1, 1), d(2024, 1, 31))];
///
/// let result = calculate(&claimant, &stoppages, config.rate_table(), config.rules()).unwrap();
/// assert_eq!(result.stoppages[0].date_effet, None);
/// assert_eq!(result.stoppages[0].decompte_days, 31);
/// assert_eq!(result.totals.total_payable_days, 0);
/// ```
pub fn calculate(
    claimant: &ClaimantContext,
    stoppages: &[Stoppage],
    rate_table: &RateTable,
    rules: &CalculationRules,
) -> EngineResult<CalculationResult> {
    claimant.validate()?;
    let participation = claimant.participation_percent()?;
    for stoppage in stoppages {
        stoppage.validate()?;
    }

    let mut audit_trace = AuditTrace::default();

    // Chronological order, remembering input positions
    let mut order: Vec<usize> = (0..stoppages.len()).collect();
    order.sort_by_key(|&i| (stoppages[i].start_date, stoppages[i].end_date));
    reject_overlaps(stoppages, &order)?;
    let sorted: Vec<Stoppage> = order.iter().map(|&i| stoppages[i].clone()).collect();

    let calendar = HolidayCalendar::from_config(&rules.calendar);
    let mut merged = merge_prolongations(&sorted, &calendar);
    for group in &mut merged {
        if let Some(indices) = group.merged_indices.as_mut() {
            for index in indices.iter_mut() {
                *index = order[*index];
            }
        }
    }
    let step_number = audit_trace.next_step_number();
    audit_trace
        .steps
        .push(merge_audit_step(stoppages.len(), &merged, step_number));
    tracing::debug!(input = stoppages.len(), groups = merged.len(), "Merged prolongations");

    let resolution = resolve_date_effets(
        &merged,
        claimant.previous_cumul_days,
        &rules.waiting_period,
        audit_trace.next_step_number(),
    );
    audit_trace.steps.extend(resolution.audit_steps);
    audit_trace.warnings.extend(resolution.warnings);

    let mut paid_days = claimant.previous_paid_days;
    let mut payment_anchor = None;
    let mut results = Vec::with_capacity(resolution.stoppages.len());

    for resolved in &resolution.stoppages {
        let step_number = audit_trace.next_step_number();
        let payable = calculate_payable_days(resolved, claimant.attestation_date, rules, step_number);
        audit_trace.steps.push(payable.audit_step);
        audit_trace.warnings.extend(payable.warning);

        let mut result = stoppage_result(resolved);

        if let (Some(date_effet), false) = (resolved.date_effet, payable.segments.is_empty()) {
            let age = claimant.age_at(date_effet);
            let anchor = *payment_anchor.get_or_insert(payable.segments[0].start);
            let band = anniversary_band(select_age_band(rules, age)?, anchor, rules.tier_counting);
            let step_number = audit_trace.next_step_number();
            let tiers = assign_tiers(&payable.segments, &band, paid_days, step_number);
            audit_trace.steps.push(tiers.audit_step);
            audit_trace.warnings.extend(tiers.warning);
            paid_days = tiers.paid_days_after;

            let step_number = audit_trace.next_step_number();
            let factor = pre_existing_factor(
                claimant,
                &resolved.stoppage.id,
                resolved.stoppage.start_date,
                rules,
                step_number,
            )?;
            audit_trace.steps.extend(factor.audit_step);
            audit_trace.warnings.extend(factor.warning);

            let pricing = PricingContext {
                classe: claimant.classe,
                participation,
                factor: factor.factor,
                table: rate_table,
                fallback: &rules.pass_fallback,
            };
            let step_number = audit_trace.next_step_number();
            let priced = price_tier_runs(&resolved.stoppage.id, &tiers.runs, &pricing, step_number)?;
            audit_trace.steps.push(priced.audit_step);
            audit_trace.warnings.extend(priced.warning);
            tracing::debug!(
                stoppage = %resolved.stoppage.id,
                paid_days = tiers.paid_days,
                subtotal = %priced.subtotal,
                "Priced stoppage"
            );

            result.payable_days = tiers.paid_days;
            result.capped_days = tiers.capped_days;
            result.year_split = year_split(tiers.runs.iter().map(|r| (r.year, r.days)));
            result.rate_breakdown = priced.entries;
            result.subtotal_amount = priced.subtotal;
        }

        results.push(result);
    }

    let totals = aggregate_totals(&results, claimant.previous_cumul_days);

    tracing::info!(
        stoppages = results.len(),
        payable_days = totals.total_payable_days,
        total = %totals.total_amount,
        warnings = audit_trace.warnings.len(),
        "Indemnity calculated"
    );

    Ok(CalculationResult {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        claimant_age_at_calc: claimant.age_at(claimant.calculation_date),
        totals,
        stoppages: results,
        audit_trace,
    })
}

/// Fails on the first stoppage starting before the previous one ends.
fn reject_overlaps(stoppages: &[Stoppage], order: &[usize]) -> EngineResult<()> {
    for pair in order.windows(2) {
        let (previous, current) = (&stoppages[pair[0]], &stoppages[pair[1]]);
        if current.start_date <= previous.end_date {
            return Err(EngineError::malformed(
                format!("stoppages[{}]", pair[1]),
                format!(
                    "stoppage {} starts on {}, before stoppage {} ends on {}",
                    current.id, current.start_date, previous.id, previous.end_date
                ),
            ));
        }
    }
    Ok(())
}

fn stoppage_result(resolved: &ResolvedStoppage) -> StoppageResult {
    let merged = &resolved.stoppage;
    StoppageResult {
        id: merged.id.clone(),
        start_date: merged.start_date,
        end_date: merged.end_date,
        merged_indices: merged.merged_indices.clone(),
        duration_days: merged.duration_days(),
        decompte_days: resolved.decompte_days,
        cumulative_days: resolved.cumulative_days,
        is_relapse: resolved.is_relapse(),
        relapse_of: resolved.relapse_of.clone(),
        date_effet: resolved.date_effet,
        declaration_date: merged.declaration_date,
        payable_days: 0,
        capped_days: 0,
        year_split: vec![],
        rate_breakdown: vec![],
        subtotal_amount: rust_decimal::Decimal::ZERO,
    }
}

fn merge_audit_step(input_count: usize, merged: &[MergedStoppage], step_number: u32) -> AuditStep {
    let folded: Vec<_> = merged
        .iter()
        .filter_map(|g| {
            g.merged_indices
                .as_ref()
                .map(|indices| serde_json::json!({ "id": g.id.as_str(), "merged_indices": indices }))
        })
        .collect();
    AuditStep {
        step_number,
        rule_id: "prolongation_merge".to_string(),
        rule_name: "Prolongation Merge".to_string(),
        input: serde_json::json!({ "stoppages": input_count }),
        output: serde_json::json!({ "groups": merged.len(), "merged": folded }),
        reasoning: if folded.is_empty() {
            "No stoppage starts on the business day after the previous one".to_string()
        } else {
            format!(
                "{} stoppages folded into {} groups",
                input_count,
                merged.len()
            )
        },
    }
}
