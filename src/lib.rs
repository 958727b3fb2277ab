//! Daily Indemnity Engine for a Disability Insurance Scheme
//!
//! This crate computes the daily indemnities ("indemnités journalières") owed
//! to a claimant for a sequence of work stoppages, applying the waiting
//! period, relapse rules, age-based rate tiers, yearly rate tables and the
//! pre-existing condition reduction, with an audit trace of every decision.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
