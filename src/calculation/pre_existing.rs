//! Pre-existing condition ("pathologie antérieure") rate factor.
//!
//! When the condition predates affiliation, the daily rate is scaled by a
//! factor chosen from the number of affiliation quarters at the stoppage
//! start. Fewer than 8 quarters pays nothing by default.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CalculationRules;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, ClaimantContext, StoppageId};

use super::date_arithmetic::calculate_trimesters;

/// Warning raised when the factor excludes the stoppage from payment.
pub const PRE_EXISTING_CONDITION_EXCLUDED: &str = "PRE_EXISTING_CONDITION_EXCLUDED";

/// A rate factor expressed as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateFactor {
    /// Numerator.
    pub numerator: u32,
    /// Denominator, never zero.
    pub denominator: u32,
}

impl RateFactor {
    /// The neutral factor.
    pub const FULL: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Scales a rate, multiplying before dividing.
    pub fn apply(&self, rate: Decimal) -> Decimal {
        if self.numerator == self.denominator {
            return rate;
        }
        rate * Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }

    /// Returns true if the factor cancels the rate.
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }
}

/// The factor applying to one stoppage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreExistingFactorResult {
    /// The factor to apply to every rate of the stoppage.
    pub factor: RateFactor,
    /// Affiliation quarters counted, when the condition is declared.
    pub quarters: Option<u32>,
    /// Set when the factor is zero.
    pub warning: Option<AuditWarning>,
    /// The audit step, when the condition is declared.
    pub audit_step: Option<AuditStep>,
}

/// Determines the pre-existing condition factor for a stoppage.
///
/// Without a declared pre-existing condition the factor is
/// [`RateFactor::FULL`] and no audit step is produced.
///
/// # Errors
///
/// [`EngineError::MalformedInput`] when the condition is declared without an
/// affiliation date, [`EngineError::CalculationError`] when no band matches.
pub fn pre_existing_factor(
    claimant: &ClaimantContext,
    stoppage_id: &StoppageId,
    stoppage_start: NaiveDate,
    rules: &CalculationRules,
    step_number: u32,
) -> EngineResult<PreExistingFactorResult> {
    if !claimant.pre_existing_condition {
        return Ok(PreExistingFactorResult {
            factor: RateFactor::FULL,
            quarters: None,
            warning: None,
            audit_step: None,
        });
    }

    let affiliation = claimant.affiliation_date.ok_or_else(|| {
        EngineError::malformed(
            "affiliation_date",
            "is required when a pre-existing condition is declared",
        )
    })?;
    let quarters = calculate_trimesters(affiliation, stoppage_start);

    let factor = if rules.pre_existing_condition.is_empty() {
        RateFactor::FULL
    } else {
        let band = rules
            .quarter_band(quarters)
            .ok_or_else(|| EngineError::CalculationError {
                message: format!("no pre-existing condition band for {} quarters", quarters),
            })?;
        RateFactor {
            numerator: band.numerator,
            denominator: band.denominator,
        }
    };

    let warning = factor.is_zero().then(|| {
        tracing::warn!(stoppage = %stoppage_id, quarters, "Pre-existing condition excludes payment");
        AuditWarning::new(
            PRE_EXISTING_CONDITION_EXCLUDED,
            format!(
                "Stoppage {}: {} affiliation quarters, a pre-existing condition is not covered",
                stoppage_id, quarters
            ),
            "high",
        )
    });

    let audit_step = AuditStep {
        step_number,
        rule_id: "pre_existing_condition".to_string(),
        rule_name: "Pre-existing Condition Factor".to_string(),
        input: serde_json::json!({
            "stoppage_id": stoppage_id.as_str(),
            "affiliation_date": affiliation.to_string(),
            "stoppage_start": stoppage_start.to_string(),
        }),
        output: serde_json::json!({
            "quarters": quarters,
            "numerator": factor.numerator,
            "denominator": factor.denominator,
        }),
        reasoning: format!(
            "{} affiliation quarters: rate multiplied by {}/{}",
            quarters, factor.numerator, factor.denominator
        ),
    };

    Ok(PreExistingFactorResult {
        factor,
        quarters: Some(quarters),
        warning,
        audit_step: Some(audit_step),
    })
}
