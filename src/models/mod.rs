//! Core data models for the IJ entitlement engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod claimant;
mod rate_table;
mod stoppage;

pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, CalculationResult, IndemnityTotals, RateBreakdownEntry,
    RateSource, StoppageResult, YearDays,
};
pub use claimant::{ClaimantContext, Classe, RateTier, Statut};
pub use rate_table::{RateLookup, RateRow, RateTable};
pub use stoppage::{Stoppage, StoppageId};
