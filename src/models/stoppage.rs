//! Stoppage ("arrêt") model and related types.
//!
//! This module defines the [`Stoppage`] input record and the stable
//! [`StoppageId`] used to reference stoppages across pipeline stages.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculation::inclusive_days;
use crate::error::{EngineError, EngineResult};

/// Stable identifier of a stoppage.
///
/// Relapse back-references and merge traceability use this identifier rather
/// than a position in the input list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoppageId(String);

impl StoppageId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoppageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A medical work-stoppage period with inclusive start and end dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stoppage {
    /// Unique identifier for the stoppage.
    pub id: StoppageId,
    /// First day of the stoppage.
    pub start_date: NaiveDate,
    /// Last day of the stoppage (inclusive).
    pub end_date: NaiveDate,
    /// Explicit relapse flag. `None` lets the engine infer it.
    #[serde(default)]
    pub relapse: Option<bool>,
    /// The date the stoppage was declared to the scheme.
    #[serde(default)]
    pub declaration_date: Option<NaiveDate>,
    /// Medical-control validation. `Some(false)` withholds payment.
    #[serde(default)]
    pub medically_validated: Option<bool>,
    /// Forced rights-open date overriding the waiting-period rules.
    #[serde(default)]
    pub forced_rights_date: Option<NaiveDate>,
}

impl Stoppage {
    /// Creates a stoppage with no flags or overrides.
    ///
    /// # Example
    ///
    /// ```
    /// use ij_engine::models::Stoppage;
    /// use chrono::NaiveDate;
    ///
    /// let stoppage = Stoppage::new(
    ///     "arret_1",
    ///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    /// );
    /// assert_eq!(stoppage.duration_days(), 31);
    /// ```
    pub fn new(id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: StoppageId::new(id),
            start_date,
            end_date,
            relapse: None,
            declaration_date: None,
            medically_validated: None,
            forced_rights_date: None,
        }
    }

    /// Returns the number of calendar days covered, both ends included.
    pub fn duration_days(&self) -> u32 {
        inclusive_days(self.start_date, self.end_date)
    }

    /// Rejects a stoppage whose end precedes its start.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidDateRange {
                stoppage_id: self.id.clone(),
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}
