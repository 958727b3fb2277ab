//! Calculation logic for the IJ entitlement engine.
//!
//! This module contains the pipeline stages, leaf-first: date arithmetic and
//! the business-day calendar, prolongation merging, waiting-period
//! ("date d'effet") resolution, payable days, rate tiers, daily rate
//! resolution with the PASS fallback, the pre-existing condition factor,
//! amount aggregation, and the [`calculate`] entry point chaining them.

mod amount;
mod daily_rate;
mod date_arithmetic;
mod date_effet;
mod engine;
mod holidays;
mod payable_days;
mod pre_existing;
mod prolongation;
mod rate_tier;

pub use amount::{PricedStoppage, PricingContext, aggregate_totals, price_tier_runs, round_for_presentation};
pub use daily_rate::{DailyRate, PASS_FORMULA_FALLBACK, pass_formula_rate, resolve_daily_rate};
pub use date_arithmetic::{
    DateSpan, YearSegment, add_years, calculate_trimesters, inclusive_days, is_next_business_day,
    last_day_of_month, quarter_of, split_by_calendar_year,
};
pub use date_effet::{
    AMBIGUOUS_RELAPSE_LINK, DateEffetResolution, RelapseClassification, ResolvedStoppage,
    resolve_date_effets,
};
pub use engine::calculate;
pub use holidays::{HolidayCalendar, easter_sunday};
pub use payable_days::{
    MEDICAL_VALIDATION_PENDING, PayableDaysResult, attestation_cap, calculate_payable_days,
};
pub use pre_existing::{
    PRE_EXISTING_CONDITION_EXCLUDED, PreExistingFactorResult, RateFactor, pre_existing_factor,
};
pub use prolongation::{MergedStoppage, continues, merge_prolongations};
pub use rate_tier::{
    BENEFIT_CAP_REACHED, TierAssignment, TierRun, anniversary_band, assign_tiers, select_age_band,
    tier_at_position,
};
