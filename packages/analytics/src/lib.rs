#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation pipeline for the crime dashboard.
//!
//! Each public function turns cleaned reports (or a count table derived
//! from them) into one of the summary tables a dashboard visual consumes.
//! All functions are pure: the same reports and [`FilterContext`] always
//! produce the same output, and nothing is retained between calls.
//!
//! Equal counts are ordered alphabetically by label (months by calendar
//! order) so every ranking is stable across runs.
//!
//! [`FilterContext`]: pdx_crime_analytics_models::FilterContext

pub mod aggregate;
pub mod summary;

pub use aggregate::*;
pub use summary::summarize;

use thiserror::Error;

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// An average was requested over an empty denominator.
    #[error("Division by zero computing {context}")]
    DivisionByZero {
        /// Which average was being computed.
        context: &'static str,
    },
}
