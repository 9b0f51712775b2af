//! One full dashboard pass over a filter selection.

use pdx_crime_analytics_models::{DashboardSummary, FilterContext, SummaryOptions};
use pdx_crime_report_models::Report;

use crate::{
    AnalyticsError, average_per_day, bucket_by_hour, bucket_by_month, count_by_neighborhood,
    count_by_offense_and_neighborhood, heatmap_matrix, neighborhood_rank, neighborhood_table,
    record_total, top_offenses,
};

/// Computes every aggregate the dashboard renders for `filter`.
///
/// The sidebar filters (offense types, crime-against) narrow the rows
/// first. The neighborhood selection is then handed to the aggregates
/// that take one, so the map still shows every neighborhood.
///
/// An empty scoped snapshot yields `record_total: None` instead of an
/// error.
///
/// # Errors
///
/// Returns [`AnalyticsError::DivisionByZero`] if `options.total_day_span`
/// is `Some(0)`.
pub fn summarize(
    reports: &[Report],
    filter: &FilterContext,
    options: &SummaryOptions,
) -> Result<DashboardSummary, AnalyticsError> {
    let scoped: Vec<&Report> = reports.iter().filter(|r| filter.matches_scope(r)).collect();
    let neighborhood = filter.neighborhood();

    let neighborhoods = count_by_neighborhood(scoped.iter().copied());
    let offense_counts = count_by_offense_and_neighborhood(scoped.iter().copied());

    let record_total = if neighborhoods.is_empty() {
        log::debug!("No reports in scope; skipping record total");
        None
    } else {
        Some(record_total(&offense_counts, neighborhood)?)
    };

    let average_per_day = options
        .total_day_span
        .map(|span| average_per_day(&offense_counts, span))
        .transpose()?;

    Ok(DashboardSummary {
        filter: filter.clone(),
        neighborhoods: neighborhood_table(&neighborhoods),
        top_offenses: top_offenses(&offense_counts, neighborhood, options.top_offenses),
        record_total,
        rank: neighborhood.and_then(|n| neighborhood_rank(&offense_counts, n)),
        average_per_day,
        hours: bucket_by_hour(reports, filter),
        months: bucket_by_month(reports, filter, options.months),
        heatmap: heatmap_matrix(
            &offense_counts,
            options.heatmap_neighborhoods,
            options.heatmap_offenses,
        ),
    })
}

#[cfg(test)]
mod tests {
    use pdx_crime_report_models::CrimeAgainst;

    use super::*;

    fn reports() -> Vec<Report> {
        let mut rows = vec![
            Report::new("A", "Theft"),
            Report::new("A", "Theft"),
            Report::new("A", "Assault"),
            Report::new("B", "Theft"),
        ];
        rows[2].crime_against = Some(CrimeAgainst::Person);
        rows
    }

    #[test]
    fn summarizes_without_filters() {
        let summary = summarize(&reports(), &FilterContext::default(), &SummaryOptions::default())
            .unwrap();

        assert_eq!(summary.neighborhoods.len(), 2);
        assert_eq!(summary.top_offenses[0].offense_type, "Theft");
        assert_eq!(summary.top_offenses[0].count, 3);
        assert_eq!(summary.record_total.unwrap().total, 4);
        assert_eq!(summary.rank, None);
        assert_eq!(summary.average_per_day, None);
        assert_eq!(summary.hours.len(), 24);
        assert!(summary.months.is_empty());
        assert_eq!(summary.heatmap.neighborhoods, vec!["A", "B"]);
    }

    #[test]
    fn neighborhood_selection_keeps_full_map() {
        let filter = FilterContext::default().with_neighborhood("B");
        let summary = summarize(&reports(), &filter, &SummaryOptions::default()).unwrap();

        assert_eq!(summary.neighborhoods.len(), 2);
        assert_eq!(summary.rank, Some(2));
        assert_eq!(summary.record_total.unwrap().total, 1);
        assert_eq!(summary.top_offenses.len(), 1);
    }

    #[test]
    fn padded_neighborhood_selection_is_trimmed() {
        let filter = FilterContext::default().with_neighborhood(" B ");
        let summary = summarize(&reports(), &filter, &SummaryOptions::default()).unwrap();

        assert_eq!(summary.rank, Some(2));
        assert_eq!(summary.record_total.unwrap().total, 1);
        assert_eq!(summary.top_offenses.len(), 1);
    }

    #[test]
    fn sidebar_filters_narrow_every_aggregate() {
        let filter = FilterContext::default().with_crime_against(Some(CrimeAgainst::Person));
        let summary = summarize(&reports(), &filter, &SummaryOptions::default()).unwrap();

        assert_eq!(summary.neighborhoods.len(), 1);
        assert_eq!(summary.neighborhoods[0].neighborhood, "A");
        assert_eq!(summary.record_total.unwrap().total, 1);
    }

    #[test]
    fn empty_scope_omits_record_total() {
        let filter = FilterContext::default().with_offense_types(["Arson"]);
        let summary = summarize(&reports(), &filter, &SummaryOptions::default()).unwrap();

        assert!(summary.neighborhoods.is_empty());
        assert!(summary.record_total.is_none());
        assert!(summary.top_offenses.is_empty());
    }

    #[test]
    fn includes_average_per_day_when_configured() {
        let options = SummaryOptions {
            total_day_span: Some(2),
            ..SummaryOptions::default()
        };
        let summary = summarize(&reports(), &FilterContext::default(), &options).unwrap();
        assert!((summary.average_per_day.unwrap() - 2.0).abs() < f64::EPSILON);

        let zero = SummaryOptions {
            total_day_span: Some(0),
            ..SummaryOptions::default()
        };
        assert!(summarize(&reports(), &FilterContext::default(), &zero).is_err());
    }
}
