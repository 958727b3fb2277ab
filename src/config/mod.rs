//! Configuration loading and management for the IJ entitlement engine.
//!
//! This module loads the scheme configuration from a directory: metadata and
//! calculation rules from YAML files, and the rate table from a CSV file.
//!
//! # Example
//!
//! ```no_run
//! use ij_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ij").unwrap();
//! println!("Loaded scheme: {}", config.scheme().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AgeBand, AttestationRules, CalculationRules, CalendarConfig, PassFallback, QuarterBand,
    SchemeMetadata, SinglePointRule, TierCoefficients, TierCounting, TierWindow, WaitingPeriodRules,
};
