//! Record normalization for the IJ entitlement engine.
//!
//! External callers send loosely-typed records, often with legacy key names.
//! This module decodes them into the typed domain records at the boundary so
//! the calculation never sees raw input.

mod fields;
mod request;

pub use fields::parse_date;
pub use request::{CalculationRequest, ClaimantRequest, StoppageRequest};
