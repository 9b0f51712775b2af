#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime report row types.
//!
//! [`RawReport`] mirrors one row of the Portland Police Bureau
//! tab-separated export exactly as read. [`Report`] is the cleaned form
//! every aggregate works from: it always has a neighborhood, and its date
//! and time have already been parsed (or marked missing).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Broad category of an offense.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum CrimeAgainst {
    /// Offenses against a person (assault, robbery, ...)
    Person,
    /// Offenses against property (theft, vandalism, ...)
    Property,
    /// Offenses against society (drug, weapons, ...)
    Society,
}

impl CrimeAgainst {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Person, Self::Property, Self::Society]
    }
}

/// Occurrence time of day, formatted as `HH:MM`.
///
/// Built from the 24-hour time code in the export (`930`, `0930`, ...).
/// The code is zero-padded to four digits and split into hours and
/// minutes without range validation, so `2575` becomes `"25:75"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurTime(String);

impl OccurTime {
    /// Parses a raw time code.
    ///
    /// Accepts one to four ASCII digits, optionally followed by a `.0`
    /// suffix left behind by spreadsheet exports. Returns `None` for
    /// anything else.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        let code = code.strip_suffix(".0").unwrap_or(code);

        if code.is_empty() || code.len() > 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let padded = format!("{code:0>4}");
        Some(Self(format!("{}:{}", &padded[..2], &padded[2..])))
    }

    /// Returns the formatted `HH:MM` text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric hour component.
    ///
    /// This is the `HH` prefix verbatim and may exceed 23 for malformed
    /// source codes.
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.0[..2].parse().unwrap_or_default()
    }
}

impl std::fmt::Display for OccurTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the raw tab-separated export.
///
/// Every column is optional so that ragged or partially filled rows still
/// deserialize; cleaning happens in a separate normalization step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReport {
    /// Neighborhood the report is attributed to.
    #[serde(rename = "Neighborhood", default)]
    pub neighborhood: Option<String>,
    /// Offense type (e.g. "Theft From Motor Vehicle").
    #[serde(rename = "OffenseType", default)]
    pub offense_type: Option<String>,
    /// Person / Property / Society.
    #[serde(rename = "CrimeAgainst", default)]
    pub crime_against: Option<String>,
    /// Date the offense occurred.
    #[serde(rename = "OccurDate", default)]
    pub occur_date: Option<String>,
    /// 24-hour time code the offense occurred.
    #[serde(rename = "OccurTime", default)]
    pub occur_time: Option<String>,
}

/// A cleaned report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Neighborhood name, never blank.
    pub neighborhood: String,
    /// Offense type. Empty when the source left it blank.
    pub offense_type: String,
    /// Offense category, if recognised.
    pub crime_against: Option<CrimeAgainst>,
    /// Occurrence date, `None` when missing or unparseable.
    pub occur_date: Option<NaiveDate>,
    /// Occurrence time, `None` when missing or unparseable.
    pub occur_time: Option<OccurTime>,
}

impl Report {
    /// Creates a report with only a neighborhood and offense type set.
    #[must_use]
    pub fn new(neighborhood: impl Into<String>, offense_type: impl Into<String>) -> Self {
        Self {
            neighborhood: neighborhood.into(),
            offense_type: offense_type.into(),
            crime_against: None,
            occur_date: None,
            occur_time: None,
        }
    }
}
