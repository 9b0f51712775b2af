#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime dashboard server.
//!
//! Aggregate results are returned using the analytics model types
//! directly; the types here cover query strings and the few responses
//! that wrap or annotate an aggregate.

use pdx_crime_analytics_models::FilterContext;
use pdx_crime_report_models::CrimeAgainst;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A query parameter that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value {value:?} for query parameter '{param}'")]
pub struct InvalidParam {
    /// Parameter name.
    pub param: &'static str,
    /// Offending value.
    pub value: String,
}

/// Query parameters shared by the aggregate endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Neighborhood selected on the map. Empty means none.
    pub neighborhood: Option<String>,
    /// Comma-separated offense types selected in the sidebar.
    pub offenses: Option<String>,
    /// `Person`, `Property`, or `Society`.
    pub crime_against: Option<String>,
    /// Row limit for ranked tables.
    pub limit: Option<usize>,
    /// Heatmap row count.
    pub rows: Option<usize>,
    /// Heatmap column count.
    pub columns: Option<usize>,
}

impl DashboardQueryParams {
    /// Builds the [`FilterContext`] these parameters describe.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParam`] if `crimeAgainst` is not a known category.
    pub fn filter_context(&self) -> Result<FilterContext, InvalidParam> {
        let crime_against = self
            .crime_against
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<CrimeAgainst>().map_err(|_| InvalidParam {
                    param: "crimeAgainst",
                    value: s.to_string(),
                })
            })
            .transpose()?;

        let offenses = self
            .offenses
            .as_deref()
            .map(|s| s.split(',').map(str::trim).collect::<Vec<_>>())
            .unwrap_or_default();

        Ok(FilterContext::default()
            .with_neighborhood(self.neighborhood.clone().unwrap_or_default())
            .with_offense_types(offenses)
            .with_crime_against(crime_against))
    }
}

/// Query parameters for the map click lookup.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LookupQueryParams {
    /// Longitude.
    pub lng: f64,
    /// Latitude.
    pub lat: f64,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Clean reports loaded.
    pub reports: usize,
    /// Neighborhood boundaries loaded.
    pub boundaries: usize,
}

/// Rank of the selected neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRank {
    /// The neighborhood that was ranked, if any was selected.
    pub neighborhood: Option<String>,
    /// 1 = most reports. `null` when nothing is selected or the
    /// neighborhood has no reports in scope.
    pub rank: Option<usize>,
    /// How many neighborhoods were ranked.
    pub out_of: usize,
}

/// Average reports per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAveragePerDay {
    /// Reports per day.
    pub average_per_day: f64,
    /// Configured day span the average was taken over.
    pub total_day_span: u32,
}

/// Result of resolving a map click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLookup {
    /// Neighborhood under the point, `null` outside every boundary.
    pub neighborhood: Option<String>,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
