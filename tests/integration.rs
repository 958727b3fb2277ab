//! Comprehensive integration tests for the IJ entitlement engine.
//!
//! This test suite runs the full pipeline against the shipped configuration:
//! - Waiting period for fresh pathologies (90 cumulative days)
//! - Relapses (15 days of their own, explicit or inferred)
//! - Payable windows, the single-point rule and the attestation cap
//! - Year splits and rate rows, including the PASS formula fallback
//! - Age-based rate tiers and the benefit cap
//! - Participation option and pre-existing condition factor
//! - Prolongation merging over weekends and public holidays
//! - Legacy request records
//! - Error cases

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use ij_engine::calculation::{
    AMBIGUOUS_RELAPSE_LINK, BENEFIT_CAP_REACHED, MEDICAL_VALIDATION_PENDING, PASS_FORMULA_FALLBACK,
    PRE_EXISTING_CONDITION_EXCLUDED, calculate,
};
use ij_engine::config::{CalculationRules, ConfigLoader, SinglePointRule, TierCounting};
use ij_engine::error::EngineError;
use ij_engine::input::CalculationRequest;
use ij_engine::models::{
    CalculationResult, ClaimantContext, Classe, RateSource, RateTier, Statut, Stoppage,
    StoppageId, YearDays,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/ij").expect("Failed to load config")
}

fn make_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Class A physician aged 48-50 over the test period.
fn create_claimant() -> ClaimantContext {
    ClaimantContext {
        birth_date: make_date("1975-05-10"),
        affiliation_date: Some(make_date("2005-01-01")),
        statut: Statut::Medecin,
        classe: Classe::A,
        option: None,
        calculation_date: make_date("2025-06-30"),
        attestation_date: None,
        previous_cumul_days: 0,
        previous_paid_days: 0,
        pre_existing_condition: false,
    }
}

/// A claimant whose rights are already open from prior claims.
fn create_open_rights_claimant() -> ClaimantContext {
    ClaimantContext {
        previous_cumul_days: 90,
        ..create_claimant()
    }
}

fn stoppage(id: &str, start: &str, end: &str) -> Stoppage {
    Stoppage::new(id, make_date(start), make_date(end))
}

fn relapse(id: &str, start: &str, end: &str, flag: Option<bool>) -> Stoppage {
    let mut s = stoppage(id, start, end);
    s.relapse = flag;
    s
}

fn run(claimant: &ClaimantContext, stoppages: &[Stoppage]) -> CalculationResult {
    let config = load_config();
    calculate(claimant, stoppages, config.rate_table(), config.rules()).expect("calculation failed")
}

fn run_with_rules(
    claimant: &ClaimantContext,
    stoppages: &[Stoppage],
    rules: &CalculationRules,
) -> CalculationResult {
    let config = load_config();
    calculate(claimant, stoppages, config.rate_table(), rules).expect("calculation failed")
}

fn assert_total_amount(result: &CalculationResult, expected: &str) {
    assert_eq!(
        result.totals.total_amount.normalize(),
        dec(expected).normalize(),
        "Expected total_amount {}, got {}",
        expected,
        result.totals.total_amount
    );
}

// =============================================================================
// SECTION 1: Waiting Period for Fresh Pathologies
// =============================================================================

#[test]
fn test_single_stoppage_below_threshold() {
    // 31 days, nothing before: the 90-day threshold is not reached
    let result = run(&create_claimant(), &[stoppage("arret_1", "2024-01-01", "2024-01-31")]);

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, None);
    assert_eq!(s.decompte_days, 31);
    assert_eq!(s.payable_days, 0);
    assert_eq!(result.totals.total_payable_days, 0);
    assert_total_amount(&result, "0");
}

#[test]
fn test_threshold_reached_in_fourth_stoppage() {
    // 43 + 17 + 18 = 78 days, the 90th day is the 12th day of the fourth stoppage
    // Expected: 2024-05-17 to 2024-06-05 = 20 days * $63.52 = $1270.40
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-02-12"),
        stoppage("b", "2024-03-01", "2024-03-17"),
        stoppage("c", "2024-04-02", "2024-04-19"),
        stoppage("d", "2024-05-06", "2024-06-05"),
    ];
    let result = run(&create_claimant(), &stoppages);

    assert_eq!(result.stoppages.len(), 4);
    for s in &result.stoppages[..3] {
        assert_eq!(s.date_effet, None, "stoppage {} should not open rights", s.id);
        assert_eq!(s.payable_days, 0);
    }
    let d = &result.stoppages[3];
    assert_eq!(d.duration_days, 31);
    assert_eq!(d.date_effet, Some(make_date("2024-05-17")));
    assert_eq!(d.decompte_days, 11);
    assert_eq!(d.cumulative_days, 109);
    assert_eq!(d.payable_days, 20);
    assert_eq!(result.totals.total_cumulative_days, 109);
    assert_total_amount(&result, "1270.40");
}

#[test]
fn test_previous_cumulative_days_shorten_the_wait() {
    // 80 prior days: the 10th day opens rights
    let claimant = ClaimantContext {
        previous_cumul_days: 80,
        ..create_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-20")]);

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-03-13")));
    assert_eq!(s.decompte_days, 9);
    assert_eq!(s.payable_days, 8);
    assert_eq!(result.totals.total_cumulative_days, 97);
}

#[test]
fn test_open_rights_pay_from_first_day() {
    let result = run(
        &create_open_rights_claimant(),
        &[stoppage("a", "2024-03-04", "2024-03-13")],
    );

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-03-04")));
    assert_eq!(s.decompte_days, 0);
    assert_eq!(s.payable_days, 10);
    assert_total_amount(&result, "635.20");
}

#[test]
fn test_forced_rights_date_overrides_waiting_period() {
    let mut s = stoppage("a", "2024-03-04", "2024-03-13");
    s.forced_rights_date = Some(make_date("2024-03-09"));
    let result = run(&create_claimant(), &[s]);

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-03-09")));
    assert_eq!(s.decompte_days, 5);
    assert_eq!(s.payable_days, 5);
}

// =============================================================================
// SECTION 2: Relapses
// =============================================================================

#[test]
fn test_short_relapse_does_not_open_rights() {
    // Day 15 of an 8-day relapse falls after its end
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-04-30"),
        relapse("r", "2024-06-03", "2024-06-10", Some(true)),
    ];
    let result = run(&create_claimant(), &stoppages);

    let r = &result.stoppages[1];
    assert!(r.is_relapse);
    assert_eq!(r.relapse_of, Some(StoppageId::new("a")));
    assert_eq!(r.date_effet, None);
    assert_eq!(r.decompte_days, 0);
    assert_eq!(r.payable_days, 0);
}

#[test]
fn test_relapse_opens_on_fifteenth_day() {
    // 20-day relapse: rights open on start + 14 days, 6 days paid
    // Expected: 6 * $63.52 = $381.12
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-04-30"),
        relapse("r", "2024-06-03", "2024-06-22", Some(true)),
    ];
    let result = run(&create_claimant(), &stoppages);

    let r = &result.stoppages[1];
    assert_eq!(r.date_effet, Some(make_date("2024-06-17")));
    assert_eq!(r.decompte_days, 14);
    assert_eq!(r.payable_days, 6);
    assert_eq!(r.subtotal_amount, dec("381.12"));
}

#[test]
fn test_long_relapse_never_uses_fresh_threshold() {
    // A 120-day relapse still opens on its 15th day, not its 90th
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-01-31"),
        relapse("r", "2024-03-04", "2024-07-01", Some(true)),
    ];
    let result = run(&create_claimant(), &stoppages);

    let r = &result.stoppages[1];
    assert!(r.is_relapse);
    assert_eq!(r.date_effet, Some(make_date("2024-03-18")));
    assert_eq!(r.decompte_days, 14);
}

#[test]
fn test_unflagged_stoppage_within_a_year_is_inferred_relapse() {
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-04-30"),
        stoppage("b", "2024-09-02", "2024-09-30"),
    ];
    let result = run(&create_claimant(), &stoppages);

    let b = &result.stoppages[1];
    assert!(b.is_relapse);
    assert_eq!(b.relapse_of, Some(StoppageId::new("a")));
    assert_eq!(b.date_effet, Some(make_date("2024-09-16")));
}

#[test]
fn test_relapse_without_predecessor_is_evaluated_as_fresh() {
    let result = run(
        &create_claimant(),
        &[relapse("r", "2024-01-01", "2024-01-31", Some(true))],
    );

    let r = &result.stoppages[0];
    assert!(!r.is_relapse);
    assert_eq!(r.relapse_of, None);
    assert_eq!(r.date_effet, None);
    assert_eq!(r.decompte_days, 31);
    assert!(result.audit_trace.has_warning(AMBIGUOUS_RELAPSE_LINK));
}

// =============================================================================
// SECTION 3: Payable Window
// =============================================================================

#[test]
fn test_date_effet_on_last_day_pays_nothing() {
    // 90-day stoppage: the 90th day is its last day
    let result = run(&create_claimant(), &[stoppage("a", "2024-01-01", "2024-03-30")]);

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-03-30")));
    assert_eq!(s.payable_days, 0);
    assert_total_amount(&result, "0");
}

#[test]
fn test_inclusive_single_point_rule_pays_one_day() {
    let mut rules = load_config().rules().clone();
    rules.single_point_rule = SinglePointRule::Inclusive;
    let result = run_with_rules(
        &create_claimant(),
        &[stoppage("a", "2024-01-01", "2024-03-30")],
        &rules,
    );

    assert_eq!(result.stoppages[0].payable_days, 1);
    assert_total_amount(&result, "63.52");
}

#[test]
fn test_attestation_late_in_month_covers_month_end() {
    // Attested on the 27th: paid through March 31st
    let claimant = ClaimantContext {
        attestation_date: Some(make_date("2024-03-27")),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-02-01", "2024-04-30")]);

    assert_eq!(result.stoppages[0].payable_days, 60);
}

#[test]
fn test_attestation_mid_month_caps_payment() {
    let claimant = ClaimantContext {
        attestation_date: Some(make_date("2024-03-15")),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-02-01", "2024-04-30")]);

    assert_eq!(result.stoppages[0].payable_days, 44);
    assert_eq!(result.stoppages[0].duration_days, 90);
}

#[test]
fn test_medical_validation_refused_withholds_payment() {
    let mut s = stoppage("a", "2024-03-04", "2024-03-13");
    s.medically_validated = Some(false);
    let result = run(&create_open_rights_claimant(), &[s]);

    assert_eq!(result.stoppages[0].payable_days, 0);
    assert_eq!(result.totals.total_cumulative_days, 100);
    assert!(result.audit_trace.has_warning(MEDICAL_VALIDATION_PENDING));
}

// =============================================================================
// SECTION 4: Year Split and Rates
// =============================================================================

#[test]
fn test_year_boundary_uses_each_year_rate() {
    // 12 days in 2024 and 10 days in 2025
    // Expected: 12 * $63.52 + 10 * $64.52 = $762.24 + $645.20 = $1407.44
    let result = run(
        &create_open_rights_claimant(),
        &[stoppage("a", "2024-12-20", "2025-01-10")],
    );

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-12-20")));
    assert_eq!(
        s.year_split,
        vec![
            YearDays { year: 2024, days: 12 },
            YearDays { year: 2025, days: 10 }
        ]
    );
    assert_eq!(s.rate_breakdown.len(), 2);
    assert_eq!(s.rate_breakdown[0].rate, dec("63.52"));
    assert_eq!(s.rate_breakdown[1].rate, dec("64.52"));
    assert_total_amount(&result, "1407.44");
}

#[test]
fn test_forced_date_across_year_boundary() {
    let mut s = stoppage("a", "2024-12-20", "2025-01-10");
    s.forced_rights_date = Some(make_date("2024-12-20"));
    let result = run(&create_claimant(), &[s]);

    assert_eq!(result.stoppages[0].payable_days, 22);
    assert_total_amount(&result, "1407.44");
}

#[test]
fn test_class_c_rate() {
    // Expected: 10 * $190.56 = $1905.60
    let claimant = ClaimantContext {
        classe: Classe::C,
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);
    assert_total_amount(&result, "1905.60");
}

#[test]
fn test_pass_formula_for_unpublished_year() {
    // Class C full tier in 2026: 3 * 48060 / 730 per day, 10 days
    let claimant = ClaimantContext {
        classe: Classe::C,
        calculation_date: make_date("2026-06-30"),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2026-01-05", "2026-01-14")]);

    let entry = &result.stoppages[0].rate_breakdown[0];
    assert_eq!(entry.rate_source, RateSource::PassFormula);
    assert_eq!(entry.rate, dec("144180") / dec("730"));
    assert_total_amount(&result, "1975.07");
    assert!(result.audit_trace.has_warning(PASS_FORMULA_FALLBACK));
}

#[test]
fn test_year_without_rate_or_pass_value_fails() {
    let claimant = ClaimantContext {
        calculation_date: make_date("2027-06-30"),
        ..create_open_rights_claimant()
    };
    let config = load_config();
    let result = calculate(
        &claimant,
        &[stoppage("a", "2027-01-04", "2027-01-13")],
        config.rate_table(),
        config.rules(),
    );

    match result {
        Err(EngineError::RateNotFound { classe, tier, date }) => {
            assert_eq!(classe, Classe::A);
            assert_eq!(tier, RateTier::Full);
            assert_eq!(date, make_date("2027-01-04"));
        }
        other => panic!("Expected RateNotFound, got {:?}", other),
    }
}

#[test]
fn test_date_before_rate_history_fails() {
    let config = load_config();
    let result = calculate(
        &create_open_rights_claimant(),
        &[stoppage("a", "2010-03-01", "2010-03-10")],
        config.rate_table(),
        config.rules(),
    );
    assert!(matches!(result, Err(EngineError::RateNotFound { .. })));
}

// =============================================================================
// SECTION 5: Rate Tiers
// =============================================================================

#[test]
fn test_senior_claimant_moves_to_reduced_tier() {
    // Aged 64, 360 days already paid: 5 full then 5 reduced
    // Expected: 5 * $63.52 + 5 * $47.64 = $317.60 + $238.20 = $555.80
    let claimant = ClaimantContext {
        birth_date: make_date("1960-01-01"),
        previous_paid_days: 360,
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);

    let breakdown = &result.stoppages[0].rate_breakdown;
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].tier, RateTier::Full);
    assert_eq!(breakdown[0].days, 5);
    assert_eq!(breakdown[1].tier, RateTier::Reduced);
    assert_eq!(breakdown[1].start_date, make_date("2024-03-09"));
    assert_total_amount(&result, "555.80");
}

#[test]
fn test_benefit_cap_stops_payment() {
    // Aged 75: 365 days at tier 3, 360 already paid
    // Expected: 5 * $31.76 = $158.80, 5 days capped
    let claimant = ClaimantContext {
        birth_date: make_date("1949-01-01"),
        previous_paid_days: 360,
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);

    let s = &result.stoppages[0];
    assert_eq!(s.payable_days, 5);
    assert_eq!(s.capped_days, 5);
    assert_eq!(s.rate_breakdown[0].tier, RateTier::FurtherReduced);
    assert_total_amount(&result, "158.80");
    assert!(result.audit_trace.has_warning(BENEFIT_CAP_REACHED));
}

#[test]
fn test_claimant_over_seventy_gets_one_year_at_tier_three() {
    // Aged 70 at the date d'effet: 365 days at tier 3, then capped
    // 2024-03-04..2025-03-03 paid (303 + 62), 2025-03-04..2025-03-13 capped
    // Expected: 303 * $31.76 + 62 * $32.26 = $9623.28 + $2000.12 = $11623.40
    let claimant = ClaimantContext {
        birth_date: make_date("1953-06-01"),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2025-03-13")]);

    let s = &result.stoppages[0];
    assert_eq!(s.date_effet, Some(make_date("2024-03-04")));
    assert_eq!(s.payable_days, 365);
    assert_eq!(s.capped_days, 10);
    assert_eq!(
        s.year_split,
        vec![
            YearDays { year: 2024, days: 303 },
            YearDays { year: 2025, days: 62 }
        ]
    );
    assert!(s.rate_breakdown.iter().all(|e| e.tier == RateTier::FurtherReduced));
    assert_eq!(s.rate_breakdown[0].rate, dec("31.76"));
    assert_eq!(s.rate_breakdown[1].rate, dec("32.26"));
    assert_eq!(s.rate_breakdown[1].end_date, make_date("2025-03-03"));
    assert_total_amount(&result, "11623.40");
    assert!(result.audit_trace.has_warning(BENEFIT_CAP_REACHED));
}

#[test]
fn test_tier_year_follows_the_calendar_in_a_leap_year() {
    // Aged 63, paid from 2024-01-01: the full-rate year ends on 2024-12-31
    // Expected: 366 * $63.52 + 31 * $48.39 = $23248.32 + $1500.09 = $24748.41
    let claimant = ClaimantContext {
        birth_date: make_date("1960-06-01"),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-01-01", "2025-01-31")]);

    let breakdown = &result.stoppages[0].rate_breakdown;
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].tier, RateTier::Full);
    assert_eq!(breakdown[0].start_date, make_date("2024-01-01"));
    assert_eq!(breakdown[0].end_date, make_date("2024-12-31"));
    assert_eq!(breakdown[0].days, 366);
    assert_eq!(breakdown[1].tier, RateTier::Reduced);
    assert_eq!(breakdown[1].start_date, make_date("2025-01-01"));
    assert_eq!(breakdown[1].days, 31);
    assert_total_amount(&result, "24748.41");
}

#[test]
fn test_paid_days_counting_moves_tier_one_day_earlier() {
    let mut rules = load_config().rules().clone();
    rules.tier_counting = TierCounting::PaidDays;
    let claimant = ClaimantContext {
        birth_date: make_date("1960-06-01"),
        ..create_open_rights_claimant()
    };
    let result = run_with_rules(&claimant, &[stoppage("a", "2024-01-01", "2025-01-31")], &rules);

    let breakdown = &result.stoppages[0].rate_breakdown;
    assert_eq!(breakdown[0].days, 365);
    assert_eq!(breakdown[1].tier, RateTier::Reduced);
    assert_eq!(breakdown[1].start_date, make_date("2024-12-31"));
}

// =============================================================================
// SECTION 6: Participation and Pre-existing Condition
// =============================================================================

#[test]
fn test_ccpl_half_option_halves_amount() {
    // Expected: 10 * $63.52 * 50% = $317.60
    let claimant = ClaimantContext {
        statut: Statut::Ccpl,
        option: Some(dec("50")),
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);
    assert_total_amount(&result, "317.60");
}

#[test]
fn test_pre_existing_condition_one_third() {
    // Affiliated 2021-01-01, stoppage in Q1 2024: 13 quarters
    // Expected: 10 * $63.52 / 3 = $211.73
    let claimant = ClaimantContext {
        affiliation_date: Some(make_date("2021-01-01")),
        pre_existing_condition: true,
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);

    let entry = &result.stoppages[0].rate_breakdown[0];
    assert_eq!(entry.base_rate, dec("63.52"));
    assert_total_amount(&result, "211.73");
}

#[test]
fn test_pre_existing_condition_recent_affiliation_excluded() {
    // 5 quarters of affiliation: not covered
    let claimant = ClaimantContext {
        affiliation_date: Some(make_date("2023-01-01")),
        pre_existing_condition: true,
        ..create_open_rights_claimant()
    };
    let result = run(&claimant, &[stoppage("a", "2024-03-04", "2024-03-13")]);

    assert_total_amount(&result, "0");
    assert!(result.audit_trace.has_warning(PRE_EXISTING_CONDITION_EXCLUDED));
}

// =============================================================================
// SECTION 7: Prolongation Merging
// =============================================================================

#[test]
fn test_prolongation_over_weekend_is_merged() {
    let stoppages = vec![
        stoppage("a", "2024-03-04", "2024-03-08"), // Monday to Friday
        stoppage("b", "2024-03-11", "2024-03-15"), // next Monday
    ];
    let result = run(&create_claimant(), &stoppages);

    assert_eq!(result.stoppages.len(), 1);
    let s = &result.stoppages[0];
    assert_eq!(s.id.as_str(), "a");
    assert_eq!(s.end_date, make_date("2024-03-15"));
    assert_eq!(s.duration_days, 10);
    assert_eq!(s.merged_indices, Some(vec![0, 1]));
}

#[test]
fn test_prolongation_over_public_holiday_is_merged() {
    // May 1st is a public holiday: Thursday May 2nd is the next business day
    let stoppages = vec![
        stoppage("a", "2024-04-22", "2024-04-30"),
        stoppage("b", "2024-05-02", "2024-05-10"),
    ];
    let result = run(&create_claimant(), &stoppages);

    assert_eq!(result.stoppages.len(), 1);
    assert_eq!(result.stoppages[0].duration_days, 18);
}

#[test]
fn test_gap_of_business_days_is_not_merged() {
    let stoppages = vec![
        stoppage("a", "2024-03-04", "2024-03-06"),
        stoppage("b", "2024-03-08", "2024-03-12"),
    ];
    let result = run(&create_claimant(), &stoppages);

    assert_eq!(result.stoppages.len(), 2);
    assert_eq!(result.stoppages[0].merged_indices, None);
}

#[test]
fn test_merged_and_literal_input_pay_the_same() {
    let split = vec![
        stoppage("a", "2024-01-01", "2024-02-29"),
        stoppage("b", "2024-03-01", "2024-04-30"),
    ];
    let whole = vec![stoppage("a", "2024-01-01", "2024-04-30")];

    let split_result = run(&create_claimant(), &split);
    let whole_result = run(&create_claimant(), &whole);

    assert_eq!(
        split_result.totals.total_payable_days,
        whole_result.totals.total_payable_days
    );
    assert_eq!(split_result.totals.total_amount, whole_result.totals.total_amount);
    assert_eq!(whole_result.totals.total_payable_days, 32);
}

// =============================================================================
// SECTION 8: Request Records
// =============================================================================

#[test]
fn test_legacy_request_record() {
    let json = r#"{
        "claimant": {
            "date_naissance": "10/05/1975",
            "classe": "A",
            "statut": "M",
            "date_calcul": "2025-06-30",
            "cumul_jours_anterieurs": "90"
        },
        "arrets": [
            {
                "arret-from-line": "20/12/2024",
                "arret-to-line": "10/01/2025",
                "rechute-line": "0",
                "valid_med_controleur": "1"
            }
        ]
    }"#;

    let (claimant, stoppages) = CalculationRequest::from_json(json)
        .unwrap()
        .into_domain()
        .unwrap();
    let result = run(&claimant, &stoppages);

    assert_eq!(result.stoppages[0].id.as_str(), "arret_1");
    assert_total_amount(&result, "1407.44");
}

#[test]
fn test_result_serializes_dates_and_amounts() {
    let result = run(
        &create_open_rights_claimant(),
        &[stoppage("a", "2024-03-04", "2024-03-13")],
    );
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["stoppages"][0]["date_effet"], "2024-03-04");
    assert_eq!(dec(json["totals"]["total_amount"].as_str().unwrap()), dec("635.20"));
    assert_eq!(json["stoppages"][0]["rate_breakdown"][0]["tier"], "full");
}

// =============================================================================
// SECTION 9: Determinism and Audit
// =============================================================================

#[test]
fn test_identical_input_gives_identical_result() {
    let stoppages = vec![
        stoppage("a", "2024-01-01", "2024-02-12"),
        stoppage("b", "2024-03-01", "2024-03-17"),
        relapse("c", "2024-06-03", "2024-06-22", Some(true)),
    ];
    let first = run(&create_claimant(), &stoppages);
    let second = run(&create_claimant(), &stoppages);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_audit_trace_records_every_stage() {
    let result = run(
        &create_open_rights_claimant(),
        &[stoppage("a", "2024-03-04", "2024-03-13")],
    );
    let rule_ids: Vec<&str> = result
        .audit_trace
        .steps
        .iter()
        .map(|s| s.rule_id.as_str())
        .collect();

    assert_eq!(
        rule_ids,
        vec!["prolongation_merge", "date_effet_resolution", "payable_days", "rate_tier", "amount"]
    );
    assert!(result.audit_trace.warnings.is_empty());
}

// =============================================================================
// SECTION 10: Error Cases
// =============================================================================

#[test]
fn test_inverted_date_range_rejected() {
    let config = load_config();
    let result = calculate(
        &create_claimant(),
        &[stoppage("bad", "2024-03-10", "2024-03-01")],
        config.rate_table(),
        config.rules(),
    );

    match result {
        Err(EngineError::InvalidDateRange { stoppage_id, .. }) => {
            assert_eq!(stoppage_id, StoppageId::new("bad"))
        }
        other => panic!("Expected InvalidDateRange, got {:?}", other),
    }
}

#[test]
fn test_overlapping_stoppages_rejected() {
    // Two fresh stoppages sharing 2024-03-15..2024-03-31 would pay those days twice
    let config = load_config();
    let result = calculate(
        &create_open_rights_claimant(),
        &[
            relapse("a", "2024-03-01", "2024-03-31", Some(false)),
            relapse("b", "2024-03-15", "2024-04-15", Some(false)),
        ],
        config.rate_table(),
        config.rules(),
    );

    match result {
        Err(EngineError::MalformedInput { field, .. }) => assert_eq!(field, "stoppages[1]"),
        other => panic!("Expected MalformedInput, got {:?}", other),
    }
}

#[test]
fn test_ccpl_without_option_rejected() {
    let claimant = ClaimantContext {
        statut: Statut::Ccpl,
        ..create_claimant()
    };
    let config = load_config();
    let result = calculate(
        &claimant,
        &[stoppage("a", "2024-03-04", "2024-03-13")],
        config.rate_table(),
        config.rules(),
    );
    assert!(matches!(result, Err(EngineError::MalformedInput { .. })));
}

#[test]
fn test_missing_birth_date_rejected_at_boundary() {
    let json = r#"{"claimant": {"classe": "A", "date_calcul": "2025-06-30"}, "arrets": []}"#;
    let result = CalculationRequest::from_json(json).unwrap().into_domain();
    assert!(matches!(result, Err(EngineError::MalformedInput { .. })));
}
