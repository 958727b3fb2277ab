//! Claimant model and related types.
//!
//! This module defines the [`ClaimantContext`] struct together with the
//! income class, professional status and rate tier enums that index the
//! rate table.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Income class of the claimant, selecting a column group of the rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classe {
    /// Lowest contribution class.
    A,
    /// Intermediate contribution class.
    B,
    /// Highest contribution class.
    C,
}

impl fmt::Display for Classe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classe::A => write!(f, "A"),
            Classe::B => write!(f, "B"),
            Classe::C => write!(f, "C"),
        }
    }
}

/// Payment-reduction stage applied to a paid day.
///
/// # Example
///
/// ```
/// use ij_engine::models::RateTier;
///
/// assert_eq!(RateTier::Reduced.number(), 2);
/// assert_eq!(RateTier::from_number(3), Some(RateTier::FurtherReduced));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    /// Tier 1, the full rate.
    Full,
    /// Tier 2, the reduced rate.
    Reduced,
    /// Tier 3, the further-reduced rate.
    FurtherReduced,
}

impl RateTier {
    /// Returns the tier number (1, 2 or 3).
    pub fn number(self) -> u8 {
        match self {
            RateTier::Full => 1,
            RateTier::Reduced => 2,
            RateTier::FurtherReduced => 3,
        }
    }

    /// Returns the tier for a number, if it is 1, 2 or 3.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(RateTier::Full),
            2 => Some(RateTier::Reduced),
            3 => Some(RateTier::FurtherReduced),
            _ => None,
        }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Professional status of the claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statut {
    /// Self-employed physician.
    #[serde(rename = "M")]
    Medecin,
    /// Physician under the simplified regime.
    #[serde(rename = "RSPM")]
    Rspm,
    /// Collaborating spouse, covered at a chosen participation percentage.
    #[serde(rename = "CCPL")]
    Ccpl,
}

/// The immutable claimant context for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimantContext {
    /// The claimant's date of birth.
    pub birth_date: NaiveDate,
    /// The date the claimant joined the scheme.
    #[serde(default)]
    pub affiliation_date: Option<NaiveDate>,
    /// The professional status.
    pub statut: Statut,
    /// The income class.
    pub classe: Classe,
    /// Participation percentage (25, 50, 100...). Required for [`Statut::Ccpl`].
    #[serde(default)]
    pub option: Option<Decimal>,
    /// The date the calculation is made for.
    pub calculation_date: NaiveDate,
    /// Administrative cap beyond which payment is not yet authorized.
    #[serde(default)]
    pub attestation_date: Option<NaiveDate>,
    /// Waiting-period days already accumulated by prior claims.
    #[serde(default)]
    pub previous_cumul_days: u32,
    /// Days already paid by prior claims, seeding the tier counter.
    #[serde(default)]
    pub previous_paid_days: u32,
    /// Whether the condition predates the affiliation ("pathologie antérieure").
    #[serde(default)]
    pub pre_existing_condition: bool,
}

impl ClaimantContext {
    /// Returns the claimant's age in completed years on `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use ij_engine::models::{ClaimantContext, Classe, Statut};
    /// use chrono::NaiveDate;
    ///
    /// let claimant = ClaimantContext {
    ///     birth_date: NaiveDate::from_ymd_opt(1962, 6, 15).unwrap(),
    ///     affiliation_date: None,
    ///     statut: Statut::Medecin,
    ///     classe: Classe::A,
    ///     option: None,
    ///     calculation_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    ///     attestation_date: None,
    ///     previous_cumul_days: 0,
    ///     previous_paid_days: 0,
    ///     pre_existing_condition: false,
    /// };
    /// assert_eq!(claimant.age_at(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), 61);
    /// assert_eq!(claimant.age_at(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), 62);
    /// ```
    pub fn age_at(&self, date: NaiveDate) -> u32 {
        if date < self.birth_date {
            return 0;
        }
        let mut age = date.year() - self.birth_date.year();
        if (date.month(), date.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Returns the participation percentage applied to every amount.
    ///
    /// Collaborating spouses must choose an option; every other status is
    /// covered at 100% unless an option is given.
    pub fn participation_percent(&self) -> EngineResult<Decimal> {
        match (self.statut, self.option) {
            (Statut::Ccpl, None) => Err(EngineError::malformed(
                "option",
                "a participation option is required for statut CCPL",
            )),
            (_, Some(option)) => Ok(option),
            (_, None) => Ok(Decimal::ONE_HUNDRED),
        }
    }

    /// Checks the claimant fields the pipeline relies on.
    pub fn validate(&self) -> EngineResult<()> {
        let option = self.participation_percent()?;
        if option <= Decimal::ZERO || option > Decimal::ONE_HUNDRED {
            return Err(EngineError::malformed(
                "option",
                format!("participation must be within (0, 100], got {}", option),
            ));
        }
        if self.birth_date > self.calculation_date {
            return Err(EngineError::malformed(
                "birth_date",
                "cannot be after the calculation date",
            ));
        }
        if self.pre_existing_condition && self.affiliation_date.is_none() {
            return Err(EngineError::malformed(
                "affiliation_date",
                "is required when a pre-existing condition is declared",
            ));
        }
        Ok(())
    }
}
