#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived count tables, filter selection, and aggregate result types.
//!
//! Every type here is a snapshot computed from the loaded reports for one
//! filter selection. Nothing is cached across selections; the dashboard
//! recomputes the whole set whenever the selection changes.

use std::collections::{BTreeMap, BTreeSet};

use pdx_crime_report_models::{CrimeAgainst, Report};
use serde::{Deserialize, Serialize};

/// Neighborhood name → report count.
pub type NeighborhoodCounts = BTreeMap<String, u64>;

/// Report counts keyed by `(neighborhood, offense type)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffenseNeighborhoodCounts(BTreeMap<(String, String), u64>);

impl OffenseNeighborhoodCounts {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds `count` to the `(neighborhood, offense)` cell.
    pub fn add(&mut self, neighborhood: &str, offense_type: &str, count: u64) {
        *self
            .0
            .entry((neighborhood.to_string(), offense_type.to_string()))
            .or_default() += count;
    }

    /// Count for a single cell, 0 when absent.
    #[must_use]
    pub fn get(&self, neighborhood: &str, offense_type: &str) -> u64 {
        self.0
            .get(&(neighborhood.to_string(), offense_type.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Iterates `(neighborhood, offense, count)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.0
            .iter()
            .map(|((n, o), c)| (n.as_str(), o.as_str(), *c))
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over every cell.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Totals per neighborhood.
    #[must_use]
    pub fn neighborhood_totals(&self) -> NeighborhoodCounts {
        let mut totals = NeighborhoodCounts::new();
        for (neighborhood, _, count) in self.iter() {
            *totals.entry(neighborhood.to_string()).or_default() += count;
        }
        totals
    }

    /// Totals per offense type, optionally restricted to one neighborhood.
    #[must_use]
    pub fn offense_totals(&self, neighborhood: Option<&str>) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for (n, offense, count) in self.iter() {
            if neighborhood.is_some_and(|wanted| wanted != n) {
                continue;
            }
            *totals.entry(offense.to_string()).or_default() += count;
        }
        totals
    }
}

impl FromIterator<((String, String), u64)> for OffenseNeighborhoodCounts {
    fn from_iter<T: IntoIterator<Item = ((String, String), u64)>>(iter: T) -> Self {
        let mut table = Self::new();
        for ((neighborhood, offense), count) in iter {
            table.add(&neighborhood, &offense, count);
        }
        table
    }
}

/// The user's current filter selection.
///
/// Passed explicitly into every aggregate. An empty neighborhood or an
/// empty offense set means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterContext {
    /// Neighborhood selected on the map.
    pub neighborhood: Option<String>,
    /// Offense types selected in the sidebar.
    #[serde(default)]
    pub offense_types: BTreeSet<String>,
    /// Crime-against category selected in the sidebar.
    pub crime_against: Option<CrimeAgainst>,
}

impl FilterContext {
    /// Sets the selected neighborhood, trimmed like the report data.
    /// Blank names clear the selection.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        let neighborhood = neighborhood.into();
        let neighborhood = neighborhood.trim();
        self.neighborhood = (!neighborhood.is_empty()).then(|| neighborhood.to_string());
        self
    }

    /// Sets the selected offense types, skipping blank entries.
    #[must_use]
    pub fn with_offense_types<I, S>(mut self, offenses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offense_types = offenses
            .into_iter()
            .map(|o| Into::<String>::into(o).trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self
    }

    /// Sets the selected crime-against category.
    #[must_use]
    pub const fn with_crime_against(mut self, crime_against: Option<CrimeAgainst>) -> Self {
        self.crime_against = crime_against;
        self
    }

    /// The selected neighborhood, `None` when unset or blank.
    #[must_use]
    pub fn neighborhood(&self) -> Option<&str> {
        self.neighborhood
            .as_deref()
            .filter(|n| !n.trim().is_empty())
    }

    /// Whether a report passes the sidebar filters (offense type and
    /// crime-against), ignoring the neighborhood selection.
    #[must_use]
    pub fn matches_scope(&self, report: &Report) -> bool {
        (self.offense_types.is_empty() || self.offense_types.contains(&report.offense_type))
            && self
                .crime_against
                .is_none_or(|wanted| report.crime_against == Some(wanted))
    }

    /// Whether a report passes every filter, including the neighborhood.
    #[must_use]
    pub fn matches(&self, report: &Report) -> bool {
        self.neighborhood()
            .is_none_or(|wanted| report.neighborhood == wanted)
            && self.matches_scope(report)
    }
}

/// One row of the neighborhood table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodCount {
    /// Neighborhood name.
    pub neighborhood: String,
    /// Report count.
    pub count: u64,
}

/// One row of the offense ranking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenseCount {
    /// Offense type.
    pub offense_type: String,
    /// Report count.
    pub count: u64,
}

/// Headline record count and how it compares to the neighborhood average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTotal {
    /// Reports for the selected neighborhood, or all reports.
    pub total: u64,
    /// Mean reports per distinct neighborhood.
    pub average: f64,
    /// `(total - average) / average * 100`.
    pub percent_delta: f64,
}

/// Report count for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourCount {
    /// Hour, 0-23.
    pub hour: u8,
    /// Report count.
    pub count: u64,
}

/// Report count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    /// English month name (e.g. "January").
    pub month: String,
    /// Report count.
    pub count: u64,
}

/// Dense neighborhood × offense matrix for the heatmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapMatrix {
    /// Row labels, busiest neighborhood first.
    pub neighborhoods: Vec<String>,
    /// Column labels, most frequent offense first.
    pub offense_types: Vec<String>,
    /// `cells[row][column]`, 0 where no reports exist.
    pub cells: Vec<Vec<u64>>,
}

impl HeatmapMatrix {
    /// Cell value by label, `None` when either label is not in the matrix.
    #[must_use]
    pub fn get(&self, neighborhood: &str, offense_type: &str) -> Option<u64> {
        let row = self.neighborhoods.iter().position(|n| n == neighborhood)?;
        let col = self.offense_types.iter().position(|o| o == offense_type)?;
        Some(self.cells[row][col])
    }
}

/// Choices for the sidebar filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChoices {
    /// Distinct neighborhoods, sorted.
    pub neighborhoods: Vec<String>,
    /// Distinct offense types, sorted.
    pub offense_types: Vec<String>,
    /// Crime-against categories present in the data.
    pub crime_against: Vec<CrimeAgainst>,
}

/// Row limits and constants used by a full dashboard pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    /// Rows in the offense ranking table.
    pub top_offenses: usize,
    /// Rows in the month chart.
    pub months: usize,
    /// Heatmap rows.
    pub heatmap_neighborhoods: usize,
    /// Heatmap columns.
    pub heatmap_offenses: usize,
    /// Calendar days covered by the dataset, if configured.
    pub total_day_span: Option<u32>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_offenses: 10,
            months: 12,
            heatmap_neighborhoods: 15,
            heatmap_offenses: 20,
            total_day_span: None,
        }
    }
}

/// Everything one rendering pass of the dashboard needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The selection this summary was computed for.
    pub filter: FilterContext,
    /// Map data: counts per neighborhood under the sidebar filters.
    pub neighborhoods: Vec<NeighborhoodCount>,
    /// Offense ranking table.
    pub top_offenses: Vec<OffenseCount>,
    /// Headline metric. `None` when no neighborhoods remain in scope.
    pub record_total: Option<RecordTotal>,
    /// Rank of the selected neighborhood, 1 = most reports.
    pub rank: Option<usize>,
    /// Average reports per day, when a day span is configured.
    pub average_per_day: Option<f64>,
    /// Time-of-day distribution, all 24 hours.
    pub hours: Vec<HourCount>,
    /// Busiest months first.
    pub months: Vec<MonthCount>,
    /// Neighborhood × offense heatmap.
    pub heatmap: HeatmapMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OffenseNeighborhoodCounts {
        let mut t = OffenseNeighborhoodCounts::new();
        t.add("A", "Theft", 2);
        t.add("A", "Assault", 1);
        t.add("B", "Theft", 1);
        t
    }

    #[test]
    fn totals_per_neighborhood_and_offense() {
        let t = table();
        assert_eq!(t.grand_total(), 4);
        assert_eq!(t.neighborhood_totals()["A"], 3);
        assert_eq!(t.neighborhood_totals()["B"], 1);
        assert_eq!(t.offense_totals(None)["Theft"], 3);
        assert_eq!(t.offense_totals(Some("A"))["Theft"], 2);
        assert!(!t.offense_totals(Some("B")).contains_key("Assault"));
    }

    #[test]
    fn add_accumulates_into_existing_cell() {
        let mut t = table();
        t.add("A", "Theft", 5);
        assert_eq!(t.get("A", "Theft"), 7);
        assert_eq!(t.get("C", "Theft"), 0);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn blank_neighborhood_means_no_filter() {
        let filter = FilterContext::default().with_neighborhood("  ");
        assert_eq!(filter.neighborhood(), None);
        assert!(filter.matches(&Report::new("Pearl", "Theft")));
    }

    #[test]
    fn padded_selections_match_trimmed_data() {
        let filter = FilterContext::default()
            .with_neighborhood(" Pearl ")
            .with_offense_types([" Theft"]);

        assert_eq!(filter.neighborhood(), Some("Pearl"));
        assert!(filter.offense_types.contains("Theft"));
        assert!(filter.matches(&Report::new("Pearl", "Theft")));
    }

    #[test]
    fn filter_matches_neighborhood_and_offenses() {
        let filter = FilterContext::default()
            .with_neighborhood("Pearl")
            .with_offense_types(["Theft", ""]);

        assert_eq!(filter.offense_types.len(), 1);
        assert!(filter.matches(&Report::new("Pearl", "Theft")));
        assert!(!filter.matches(&Report::new("Pearl", "Arson")));
        assert!(!filter.matches(&Report::new("Buckman", "Theft")));
        assert!(filter.matches_scope(&Report::new("Buckman", "Theft")));
    }

    #[test]
    fn filter_matches_crime_against() {
        let filter = FilterContext::default().with_crime_against(Some(CrimeAgainst::Person));
        let mut report = Report::new("Pearl", "Robbery");
        assert!(!filter.matches(&report));
        report.crime_against = Some(CrimeAgainst::Person);
        assert!(filter.matches(&report));
    }

    #[test]
    fn heatmap_lookup_by_label() {
        let matrix = HeatmapMatrix {
            neighborhoods: vec!["A".into(), "B".into()],
            offense_types: vec!["Theft".into()],
            cells: vec![vec![2], vec![1]],
        };
        assert_eq!(matrix.get("B", "Theft"), Some(1));
        assert_eq!(matrix.get("C", "Theft"), None);
    }
}
