//! Request types for the IJ entitlement engine.
//!
//! This module defines the external JSON shape of a calculation request and
//! its conversion into the typed [`ClaimantContext`] and [`Stoppage`] records
//! the engine works on. Legacy key names are accepted as aliases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{ClaimantContext, Classe, Statut, Stoppage, StoppageId};

use super::fields;

/// A calculation request: one claimant and their stoppages.
///
/// # Example
///
/// ```
/// use ij_engine::input::CalculationRequest;
///
/// let json = r#"{
///     "claimant": {
///         "date_naissance": "12/04/1980",
///         "classe": "B",
///         "statut": "M",
///         "calculation_date": "2024-12-31"
///     },
///     "arrets": [
///         { "arret-from-line": "2024-01-01", "arret-to-line": "2024-01-31", "rechute-line": 0 }
///     ]
/// }"#;
///
/// let (claimant, stoppages) = CalculationRequest::from_json(json)
///     .unwrap()
///     .into_domain()
///     .unwrap();
/// assert_eq!(stoppages[0].id.as_str(), "arret_1");
/// assert_eq!(stoppages[0].relapse, Some(false));
/// assert_eq!(claimant.previous_cumul_days, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The claimant information.
    pub claimant: ClaimantRequest,
    /// The stoppages, in any order.
    #[serde(alias = "arrets", default)]
    pub stoppages: Vec<StoppageRequest>,
}

/// Claimant information in a calculation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimantRequest {
    /// Date of birth.
    #[serde(alias = "date_naissance", default, deserialize_with = "fields::date")]
    pub birth_date: Option<NaiveDate>,
    /// Affiliation date.
    #[serde(alias = "date_affiliation", default, deserialize_with = "fields::date")]
    pub affiliation_date: Option<NaiveDate>,
    /// Status code: `M`, `RSPM` or `CCPL`. Defaults to `M`.
    #[serde(default, deserialize_with = "fields::text")]
    pub statut: Option<String>,
    /// Income class: `A`, `B` or `C`.
    #[serde(default, deserialize_with = "fields::text")]
    pub classe: Option<String>,
    /// Participation percentage.
    #[serde(default, deserialize_with = "fields::decimal")]
    pub option: Option<Decimal>,
    /// The date the calculation is made for.
    #[serde(
        alias = "current_date",
        alias = "date_calcul",
        default,
        deserialize_with = "fields::date"
    )]
    pub calculation_date: Option<NaiveDate>,
    /// Attestation date capping payment.
    #[serde(alias = "date_attestation", default, deserialize_with = "fields::date")]
    pub attestation_date: Option<NaiveDate>,
    /// Waiting-period days from prior claims.
    #[serde(alias = "cumul_jours_anterieurs", default, deserialize_with = "fields::count")]
    pub previous_cumul_days: Option<u32>,
    /// Paid days from prior claims.
    #[serde(alias = "jours_payes_anterieurs", default, deserialize_with = "fields::count")]
    pub previous_paid_days: Option<u32>,
    /// Pre-existing condition flag.
    #[serde(alias = "pathologie_anterieure", default, deserialize_with = "fields::flag")]
    pub pre_existing_condition: Option<bool>,
}

/// Stoppage information in a calculation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoppageRequest {
    /// Identifier; defaults to `arret_<n>` with `n` the 1-based position.
    #[serde(default, deserialize_with = "fields::text")]
    pub id: Option<String>,
    /// First day of the stoppage.
    #[serde(alias = "arret-from-line", default, deserialize_with = "fields::date")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the stoppage.
    #[serde(alias = "arret-to-line", default, deserialize_with = "fields::date")]
    pub end_date: Option<NaiveDate>,
    /// Relapse flag; unset lets the engine infer it.
    #[serde(alias = "rechute-line", default, deserialize_with = "fields::flag")]
    pub relapse: Option<bool>,
    /// Declaration date.
    #[serde(alias = "declaration-date-line", default, deserialize_with = "fields::date")]
    pub declaration_date: Option<NaiveDate>,
    /// Medical-control validation.
    #[serde(alias = "valid_med_controleur", default, deserialize_with = "fields::flag")]
    pub medically_validated: Option<bool>,
    /// Forced rights-open date.
    #[serde(alias = "date_deb_droit", default, deserialize_with = "fields::date")]
    pub forced_rights_date: Option<NaiveDate>,
}

impl CalculationRequest {
    /// Parses a request from JSON.
    ///
    /// Syntax errors and undecodable values are reported as
    /// [`EngineError::MalformedInput`].
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::malformed("request", e.to_string()))
    }

    /// Converts the request into validated domain records.
    pub fn into_domain(self) -> EngineResult<(ClaimantContext, Vec<Stoppage>)> {
        let claimant = self.claimant.into_domain()?;
        let stoppages = self
            .stoppages
            .into_iter()
            .enumerate()
            .map(|(position, stoppage)| stoppage.into_domain(position))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok((claimant, stoppages))
    }
}

impl ClaimantRequest {
    /// Converts the claimant into a validated [`ClaimantContext`].
    pub fn into_domain(self) -> EngineResult<ClaimantContext> {
        let birth_date = self
            .birth_date
            .ok_or_else(|| EngineError::malformed("birth_date", "is required"))?;
        let calculation_date = self
            .calculation_date
            .ok_or_else(|| EngineError::malformed("calculation_date", "is required"))?;
        let classe = match self.classe.as_deref() {
            Some(code) => parse_classe(code)?,
            None => return Err(EngineError::malformed("classe", "is required")),
        };
        let statut = match self.statut.as_deref() {
            Some(code) => parse_statut(code)?,
            None => Statut::Medecin,
        };

        let claimant = ClaimantContext {
            birth_date,
            affiliation_date: self.affiliation_date,
            statut,
            classe,
            option: self.option,
            calculation_date,
            attestation_date: self.attestation_date,
            previous_cumul_days: self.previous_cumul_days.unwrap_or(0),
            previous_paid_days: self.previous_paid_days.unwrap_or(0),
            pre_existing_condition: self.pre_existing_condition.unwrap_or(false),
        };
        claimant.validate()?;
        Ok(claimant)
    }
}

impl StoppageRequest {
    /// Converts the stoppage at `position` (0-based) into a [`Stoppage`].
    pub fn into_domain(self, position: usize) -> EngineResult<Stoppage> {
        let id = self
            .id
            .map(StoppageId::new)
            .unwrap_or_else(|| StoppageId::new(format!("arret_{}", position + 1)));
        let start_date = self.start_date.ok_or_else(|| {
            EngineError::malformed(format!("stoppages[{}].start_date", position), "is required")
        })?;
        let end_date = self.end_date.ok_or_else(|| {
            EngineError::malformed(format!("stoppages[{}].end_date", position), "is required")
        })?;

        Ok(Stoppage {
            id,
            start_date,
            end_date,
            relapse: self.relapse,
            declaration_date: self.declaration_date,
            medically_validated: self.medically_validated,
            forced_rights_date: self.forced_rights_date,
        })
    }
}

fn parse_classe(code: &str) -> EngineResult<Classe> {
    match code.to_ascii_uppercase().as_str() {
        "A" => Ok(Classe::A),
        "B" => Ok(Classe::B),
        "C" => Ok(Classe::C),
        other => Err(EngineError::malformed(
            "classe",
            format!("'{}' is not one of A, B, C", other),
        )),
    }
}

fn parse_statut(code: &str) -> EngineResult<Statut> {
    match code.to_ascii_uppercase().as_str() {
        "M" => Ok(Statut::Medecin),
        "RSPM" => Ok(Statut::Rspm),
        "CCPL" => Ok(Statut::Ccpl),
        other => Err(EngineError::malformed(
            "statut",
            format!("'{}' is not one of M, RSPM, CCPL", other),
        )),
    }
}
