//! Configuration types for indemnity calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration files.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Classe, RateTier};

/// Metadata about the insurance scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeMetadata {
    /// Short scheme code.
    pub code: String,
    /// The human-readable name of the scheme.
    pub name: String,
    /// The version or effective date of the rule set.
    pub version: String,
    /// URL to the official scheme documentation.
    pub source_url: String,
}

/// Waiting-period thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingPeriodRules {
    /// Cumulative days before rights open for a new pathology.
    pub fresh_threshold_days: u32,
    /// Days from its own start before rights open for a relapse.
    pub relapse_threshold_days: u32,
    /// An unflagged stoppage starting within this many years of the prior
    /// stoppage's end is inferred as a relapse.
    pub relapse_window_years: u32,
}

impl Default for WaitingPeriodRules {
    fn default() -> Self {
        Self {
            fresh_threshold_days: 90,
            relapse_threshold_days: 15,
            relapse_window_years: 1,
        }
    }
}

/// How a payable window reduced to a single day is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinglePointRule {
    /// A window whose start equals its end pays zero days.
    #[default]
    Exclusive,
    /// A window whose start equals its end pays one day.
    Inclusive,
}

/// How tier windows measure a year of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierCounting {
    /// Windows of whole years end on the anniversary of the first paid day.
    #[default]
    Anniversary,
    /// Windows hold exactly their configured number of paid days.
    PaidDays,
}

/// Attestation cap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRules {
    /// From this day of month on, the cap extends to the month's last day.
    /// `None` disables the extension.
    pub month_end_extension_day: Option<u32>,
}

impl Default for AttestationRules {
    fn default() -> Self {
        Self {
            month_end_extension_day: Some(27),
        }
    }
}

/// A run of consecutive paid days paid at one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierWindow {
    /// The tier paid within the window.
    pub tier: RateTier,
    /// Number of paid days in the window.
    pub days: u32,
}

/// Tier windows applying to claimants within an age range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    /// Youngest age of the band (inclusive).
    pub min_age: u32,
    /// Oldest age of the band (inclusive); `None` for the open-ended band.
    #[serde(default)]
    pub max_age: Option<u32>,
    /// Successive tier windows; paid days beyond their sum are not paid.
    pub windows: Vec<TierWindow>,
}

impl AgeBand {
    /// Returns true if `age` falls within the band.
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && self.max_age.is_none_or(|max| age <= max)
    }

    /// Returns the total number of payable days the band allows.
    pub fn total_days(&self) -> u32 {
        self.windows.iter().map(|w| w.days).sum()
    }
}

/// Rate factor for a pre-existing condition, by affiliation quarters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterBand {
    /// Fewest quarters of the band (inclusive).
    pub min_quarters: u32,
    /// Most quarters of the band (inclusive); `None` for the open-ended band.
    #[serde(default)]
    pub max_quarters: Option<u32>,
    /// Factor numerator.
    pub numerator: u32,
    /// Factor denominator.
    pub denominator: u32,
}

impl QuarterBand {
    /// Returns true if `quarters` falls within the band.
    pub fn contains(&self, quarters: u32) -> bool {
        quarters >= self.min_quarters && self.max_quarters.is_none_or(|max| quarters <= max)
    }
}

/// PASS multipliers for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCoefficients {
    /// Multiplier for tier 1.
    pub full: Decimal,
    /// Multiplier for tier 2.
    pub reduced: Decimal,
    /// Multiplier for tier 3.
    pub further_reduced: Decimal,
}

impl TierCoefficients {
    /// Returns the multiplier for a tier.
    pub fn for_tier(&self, tier: RateTier) -> Decimal {
        match tier {
            RateTier::Full => self.full,
            RateTier::Reduced => self.reduced,
            RateTier::FurtherReduced => self.further_reduced,
        }
    }
}

/// The PASS-based formula used for years the rate table does not cover yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFallback {
    /// Divisor applied to `k × PASS`.
    pub divisor: Decimal,
    /// Annual PASS values by calendar year.
    pub annual_values: BTreeMap<i32, Decimal>,
    /// Multipliers `k` by class.
    pub coefficients: BTreeMap<Classe, TierCoefficients>,
}

/// Business-day calendar settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Whether French public holidays are non-business days.
    #[serde(default)]
    pub french_public_holidays: bool,
    /// Additional non-business dates.
    #[serde(default)]
    pub extra_holidays: Vec<NaiveDate>,
}

/// The complete rule set of a calculation, from `rules.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRules {
    /// Waiting-period thresholds.
    #[serde(default)]
    pub waiting_period: WaitingPeriodRules,
    /// Single-day payable window interpretation.
    #[serde(default)]
    pub single_point_rule: SinglePointRule,
    /// How tier windows measure a year of payment.
    #[serde(default)]
    pub tier_counting: TierCounting,
    /// Attestation cap settings.
    #[serde(default)]
    pub attestation: AttestationRules,
    /// Tier windows by age, contiguous from age 0.
    pub age_bands: Vec<AgeBand>,
    /// Rate factors for pre-existing conditions.
    #[serde(default)]
    pub pre_existing_condition: Vec<QuarterBand>,
    /// Formula for years without a published rate row.
    pub pass_fallback: PassFallback,
    /// Business-day calendar used to merge prolongations.
    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl CalculationRules {
    /// Returns the age band containing `age`.
    pub fn age_band(&self, age: u32) -> Option<&AgeBand> {
        self.age_bands.iter().find(|band| band.contains(age))
    }

    /// Returns the pre-existing-condition band containing `quarters`.
    pub fn quarter_band(&self, quarters: u32) -> Option<&QuarterBand> {
        self.pre_existing_condition
            .iter()
            .find(|band| band.contains(quarters))
    }

    /// Checks that bands are contiguous and open-ended and that factors are usable.
    ///
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        let mut expected_age = 0;
        for (i, band) in self.age_bands.iter().enumerate() {
            if band.min_age != expected_age {
                return Err(format!(
                    "age band {} starts at {} but {} was expected",
                    i, band.min_age, expected_age
                ));
            }
            match band.max_age {
                Some(max) if max < band.min_age => {
                    return Err(format!("age band {} ends before it starts", i));
                }
                Some(max) => expected_age = max + 1,
                None if i + 1 == self.age_bands.len() => return self.check_quarter_bands(),
                None => return Err(format!("age band {} is open-ended but not last", i)),
            }
        }
        Err("the last age band must be open-ended".to_string())
    }

    fn check_quarter_bands(&self) -> Result<(), String> {
        if self.pre_existing_condition.is_empty() {
            return Ok(());
        }
        let mut expected = 0;
        for (i, band) in self.pre_existing_condition.iter().enumerate() {
            if band.denominator == 0 {
                return Err(format!("quarter band {} has a zero denominator", i));
            }
            if band.min_quarters != expected {
                return Err(format!(
                    "quarter band {} starts at {} but {} was expected",
                    i, band.min_quarters, expected
                ));
            }
            match band.max_quarters {
                Some(max) if max < band.min_quarters => {
                    return Err(format!("quarter band {} ends before it starts", i));
                }
                Some(max) => expected = max + 1,
                None if i + 1 == self.pre_existing_condition.len() => return Ok(()),
                None => return Err(format!("quarter band {} is open-ended but not last", i)),
            }
        }
        Err("the last quarter band must be open-ended".to_string())
    }
}
