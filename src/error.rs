//! Error types for the IJ entitlement engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can abort an indemnity calculation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Classe, RateTier, StoppageId};

/// The main error type for the IJ entitlement engine.
///
/// Every failure is fatal for the calculation it occurs in: the engine is
/// deterministic and side-effect free, so nothing is retried and no partial
/// result is returned.
///
/// # Example
///
/// ```
/// use ij_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/rules.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/rules.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or holds an inconsistent rule set.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The rate table rows are inconsistent (inverted or overlapping ranges).
    #[error("Invalid rate table: {message}")]
    InvalidRateTable {
        /// A description of the inconsistency.
        message: String,
    },

    /// No rate row covers the date and no fallback formula applies.
    #[error("Rate not found for class {classe}, tier {tier} on date {date}")]
    RateNotFound {
        /// The claimant's income class.
        classe: Classe,
        /// The requested rate tier.
        tier: RateTier,
        /// The date for which the rate was requested.
        date: NaiveDate,
    },

    /// A stoppage ends before it starts.
    #[error("Invalid date range for stoppage '{stoppage_id}': end {end} precedes start {start}")]
    InvalidDateRange {
        /// The identifier of the offending stoppage.
        stoppage_id: StoppageId,
        /// The declared start date.
        start: NaiveDate,
        /// The declared end date.
        end: NaiveDate,
    },

    /// A required input field is missing or unusable.
    #[error("Malformed input field '{field}': {message}")]
    MalformedInput {
        /// The field that was missing or invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::MalformedInput`] error.
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::MalformedInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
