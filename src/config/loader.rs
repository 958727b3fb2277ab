//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the scheme
//! metadata, the calculation rules and the rate table from a directory.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{RateRow, RateTable};

use super::types::{CalculationRules, SchemeMetadata};

/// Loads and provides access to the scheme configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/ij/
/// ├── scheme.yaml   # Scheme metadata
/// ├── rules.yaml    # Waiting periods, tiers, fallback formula, calendar
/// └── rates.csv     # One rate row per date range, nine daily rates each
/// ```
///
/// The loaded configuration is immutable; wrap it in an `Arc` to share it
/// between threads.
///
/// # Example
///
/// ```no_run
/// use ij_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/ij").unwrap();
/// println!("Loaded scheme: {}", loader.scheme().name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    metadata: SchemeMetadata,
    rules: CalculationRules,
    rate_table: RateTable,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file is syntactically invalid or the rule set is inconsistent
    ///   (`ConfigParseError`)
    /// - Rate rows are inverted or overlap (`InvalidRateTable`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<SchemeMetadata>(&path.join("scheme.yaml"))?;

        let rules_path = path.join("rules.yaml");
        let rules = Self::load_yaml::<CalculationRules>(&rules_path)?;
        rules
            .check()
            .map_err(|message| EngineError::ConfigParseError {
                path: rules_path.display().to_string(),
                message,
            })?;

        let rate_table = Self::load_rates(&path.join("rates.csv"))?;

        tracing::debug!(
            scheme = %metadata.code,
            rate_rows = rate_table.rows().len(),
            "Loaded scheme configuration"
        );

        Ok(Self {
            metadata,
            rules,
            rate_table,
        })
    }

    /// Builds a loader from already-parsed parts.
    pub fn from_parts(
        metadata: SchemeMetadata,
        rules: CalculationRules,
        rate_table: RateTable,
    ) -> EngineResult<Self> {
        rules
            .check()
            .map_err(|message| EngineError::ConfigParseError {
                path: "<in-memory rules>".to_string(),
                message,
            })?;
        Ok(Self {
            metadata,
            rules,
            rate_table,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads the rate table from a CSV file with a header row.
    fn load_rates(path: &Path) -> EngineResult<RateTable> {
        let path_str = path.display().to_string();

        if !path.exists() {
            return Err(EngineError::ConfigNotFound { path: path_str });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| EngineError::ConfigParseError {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        let mut rows = Vec::new();
        for (row_idx, record) in reader.deserialize::<RateRow>().enumerate() {
            // +2: one-based line numbers, after the header
            let row = record.map_err(|e| EngineError::ConfigParseError {
                path: path_str.clone(),
                message: format!("line {}: {}", row_idx + 2, e),
            })?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(EngineError::ConfigParseError {
                path: path_str,
                message: "no rate rows found".to_string(),
            });
        }

        RateTable::new(rows)
    }

    /// Returns the scheme metadata.
    pub fn scheme(&self) -> &SchemeMetadata {
        &self.metadata
    }

    /// Returns the calculation rules.
    pub fn rules(&self) -> &CalculationRules {
        &self.rules
    }

    /// Returns the rate table.
    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }
}
