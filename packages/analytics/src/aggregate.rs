//! Grouping, ranking, and bucketing operations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike as _, Month};
use pdx_crime_analytics_models::{
    FilterChoices, FilterContext, HeatmapMatrix, HourCount, MonthCount, NeighborhoodCount,
    NeighborhoodCounts, OffenseCount, OffenseNeighborhoodCounts, RecordTotal,
};
use pdx_crime_report_models::Report;

use crate::AnalyticsError;

/// Counts reports per neighborhood.
#[must_use]
pub fn count_by_neighborhood<'a, I>(reports: I) -> NeighborhoodCounts
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut counts = NeighborhoodCounts::new();
    for report in reports {
        *counts.entry(report.neighborhood.clone()).or_default() += 1;
    }
    counts
}

/// Counts reports per `(neighborhood, offense type)` pair.
#[must_use]
pub fn count_by_offense_and_neighborhood<'a, I>(reports: I) -> OffenseNeighborhoodCounts
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut counts = OffenseNeighborhoodCounts::new();
    for report in reports {
        counts.add(&report.neighborhood, &report.offense_type, 1);
    }
    counts
}

/// Neighborhood counts as table rows, most reports first.
#[must_use]
pub fn neighborhood_table(counts: &NeighborhoodCounts) -> Vec<NeighborhoodCount> {
    rank_descending(counts.clone())
        .into_iter()
        .map(|(neighborhood, count)| NeighborhoodCount {
            neighborhood,
            count,
        })
        .collect()
}

/// The `limit` most frequent offense types.
///
/// With a neighborhood, only that neighborhood's cells are summed;
/// without one, cells are summed across every neighborhood.
#[must_use]
pub fn top_offenses(
    counts: &OffenseNeighborhoodCounts,
    neighborhood: Option<&str>,
    limit: usize,
) -> Vec<OffenseCount> {
    let mut ranked = rank_descending(counts.offense_totals(neighborhood));
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(offense_type, count)| OffenseCount {
            offense_type,
            count,
        })
        .collect()
}

/// Headline total and its deviation from the per-neighborhood average.
///
/// The average is always taken over every neighborhood in `counts`. When
/// no neighborhood is given the total is the grand total, so the delta is
/// measured between the grand total and that same average.
///
/// # Errors
///
/// Returns [`AnalyticsError::DivisionByZero`] if `counts` holds no
/// neighborhoods.
#[allow(clippy::cast_precision_loss)]
pub fn record_total(
    counts: &OffenseNeighborhoodCounts,
    neighborhood: Option<&str>,
) -> Result<RecordTotal, AnalyticsError> {
    let totals = counts.neighborhood_totals();
    if totals.is_empty() {
        return Err(AnalyticsError::DivisionByZero {
            context: "average reports per neighborhood",
        });
    }

    let grand_total: u64 = totals.values().sum();
    let average = grand_total as f64 / totals.len() as f64;

    let total = neighborhood.map_or(grand_total, |n| totals.get(n).copied().unwrap_or(0));

    // An all-zero table can only come from hand-built counts.
    let percent_delta = if grand_total == 0 {
        0.0
    } else {
        (total as f64 - average) / average * 100.0
    };

    Ok(RecordTotal {
        total,
        average,
        percent_delta,
    })
}

/// 1-based rank of a neighborhood by total reports, busiest first.
///
/// Returns `None` when the neighborhood has no reports.
#[must_use]
pub fn neighborhood_rank(counts: &OffenseNeighborhoodCounts, neighborhood: &str) -> Option<usize> {
    rank_descending(counts.neighborhood_totals())
        .iter()
        .position(|(name, _)| name == neighborhood)
        .map(|idx| idx + 1)
}

/// Mean reports per calendar day.
///
/// `total_day_span` is the number of days the dataset covers. It comes
/// from configuration, not from the report dates.
///
/// # Errors
///
/// Returns [`AnalyticsError::DivisionByZero`] if `total_day_span` is 0.
#[allow(clippy::cast_precision_loss)]
pub fn average_per_day(
    counts: &OffenseNeighborhoodCounts,
    total_day_span: u32,
) -> Result<f64, AnalyticsError> {
    if total_day_span == 0 {
        return Err(AnalyticsError::DivisionByZero {
            context: "average reports per day",
        });
    }
    Ok(counts.grand_total() as f64 / f64::from(total_day_span))
}

/// Reports per hour of day under `filter`, all 24 hours present.
///
/// Reports without a time, and reports whose unvalidated time code has an
/// hour above 23, are left out.
#[must_use]
pub fn bucket_by_hour(reports: &[Report], filter: &FilterContext) -> Vec<HourCount> {
    let mut buckets = [0_u64; 24];
    let mut out_of_range = 0_u64;

    for time in reports
        .iter()
        .filter(|r| filter.matches(r))
        .filter_map(|r| r.occur_time.as_ref())
    {
        match buckets.get_mut(usize::from(time.hour())) {
            Some(bucket) => *bucket += 1,
            None => out_of_range += 1,
        }
    }

    if out_of_range > 0 {
        log::debug!("{out_of_range} reports have an hour outside 0-23");
    }

    (0_u8..24)
        .zip(buckets)
        .map(|(hour, count)| HourCount { hour, count })
        .collect()
}

/// Reports per calendar month under `filter`, busiest first.
///
/// Reports without a parseable date are left out. Months with no reports
/// are omitted; ties keep calendar order.
#[must_use]
pub fn bucket_by_month(reports: &[Report], filter: &FilterContext, limit: usize) -> Vec<MonthCount> {
    let mut buckets = [0_u64; 12];

    for date in reports
        .iter()
        .filter(|r| filter.matches(r))
        .filter_map(|r| r.occur_date)
    {
        buckets[date.month0() as usize] += 1;
    }

    let mut months: Vec<MonthCount> = (1_u8..=12)
        .zip(buckets)
        .filter(|(_, count)| *count > 0)
        .filter_map(|(number, count)| {
            Month::try_from(number).ok().map(|month| MonthCount {
                month: month.name().to_string(),
                count,
            })
        })
        .collect();

    months.sort_by(|a, b| b.count.cmp(&a.count));
    months.truncate(limit);
    months
}

/// Pivots the busiest neighborhoods and offense types into a dense matrix.
///
/// Rows are the `top_neighborhoods` neighborhoods with the most reports,
/// columns the `top_offenses` most frequent offense types overall. Cells
/// with no reports are 0.
#[must_use]
pub fn heatmap_matrix(
    counts: &OffenseNeighborhoodCounts,
    top_neighborhoods: usize,
    top_offenses: usize,
) -> HeatmapMatrix {
    let neighborhoods: Vec<String> = rank_descending(counts.neighborhood_totals())
        .into_iter()
        .take(top_neighborhoods)
        .map(|(name, _)| name)
        .collect();

    let offense_types: Vec<String> = rank_descending(counts.offense_totals(None))
        .into_iter()
        .take(top_offenses)
        .map(|(name, _)| name)
        .collect();

    let cells = neighborhoods
        .iter()
        .map(|n| offense_types.iter().map(|o| counts.get(n, o)).collect())
        .collect();

    HeatmapMatrix {
        neighborhoods,
        offense_types,
        cells,
    }
}

/// Distinct values for the sidebar filter widgets.
#[must_use]
pub fn filter_choices(reports: &[Report]) -> FilterChoices {
    let mut neighborhoods = BTreeSet::new();
    let mut offense_types = BTreeSet::new();
    let mut crime_against = BTreeSet::new();

    for report in reports {
        neighborhoods.insert(report.neighborhood.as_str());
        if !report.offense_type.is_empty() {
            offense_types.insert(report.offense_type.as_str());
        }
        if let Some(category) = report.crime_against {
            crime_against.insert(category);
        }
    }

    FilterChoices {
        neighborhoods: neighborhoods.into_iter().map(String::from).collect(),
        offense_types: offense_types.into_iter().map(String::from).collect(),
        crime_against: crime_against.into_iter().collect(),
    }
}

/// Sorts a label → count map by count descending.
///
/// The map iterates in label order and the sort is stable, so equal
/// counts stay alphabetical.
fn rank_descending(totals: BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pdx_crime_report_models::OccurTime;

    use super::*;

    fn example_reports() -> Vec<Report> {
        vec![
            Report::new("A", "Theft"),
            Report::new("A", "Theft"),
            Report::new("A", "Assault"),
            Report::new("B", "Theft"),
        ]
    }

    fn timed(neighborhood: &str, offense: &str, date: Option<(i32, u32, u32)>, time: &str) -> Report {
        Report {
            occur_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            occur_time: OccurTime::from_code(time),
            ..Report::new(neighborhood, offense)
        }
    }

    fn offense_pairs(rows: &[OffenseCount]) -> Vec<(&str, u64)> {
        rows.iter()
            .map(|r| (r.offense_type.as_str(), r.count))
            .collect()
    }

    #[test]
    fn counts_example_by_neighborhood() {
        let counts = count_by_neighborhood(&example_reports());
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 3);
        assert_eq!(counts["B"], 1);
    }

    #[test]
    fn neighborhood_counts_conserve_rows() {
        let reports = example_reports();
        let counts = count_by_neighborhood(&reports);
        assert_eq!(counts.values().sum::<u64>(), reports.len() as u64);

        let pairs = count_by_offense_and_neighborhood(&reports);
        assert_eq!(pairs.grand_total(), reports.len() as u64);
    }

    #[test]
    fn counts_offense_neighborhood_pairs() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        assert_eq!(counts.get("A", "Theft"), 2);
        assert_eq!(counts.get("A", "Assault"), 1);
        assert_eq!(counts.get("B", "Theft"), 1);
        assert_eq!(counts.get("B", "Assault"), 0);
    }

    #[test]
    fn top_offenses_for_example() {
        let counts = count_by_offense_and_neighborhood(&example_reports());

        assert_eq!(
            offense_pairs(&top_offenses(&counts, Some("A"), 10)),
            vec![("Theft", 2), ("Assault", 1)]
        );
        assert_eq!(
            offense_pairs(&top_offenses(&counts, None, 10)),
            vec![("Theft", 3), ("Assault", 1)]
        );
    }

    #[test]
    fn top_offenses_respects_limit_and_order() {
        let mut reports = Vec::new();
        for (i, offense) in ('a'..='o').enumerate() {
            for _ in 0..=i {
                reports.push(Report::new("A", offense.to_string()));
            }
        }
        let counts = count_by_offense_and_neighborhood(&reports);

        let top = top_offenses(&counts, None, 10);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(top[0].offense_type, "o");
    }

    #[test]
    fn top_offenses_ties_are_alphabetical() {
        let reports = vec![
            Report::new("A", "Vandalism"),
            Report::new("A", "Arson"),
            Report::new("B", "Burglary"),
        ];
        let counts = count_by_offense_and_neighborhood(&reports);
        assert_eq!(
            offense_pairs(&top_offenses(&counts, None, 10)),
            vec![("Arson", 1), ("Burglary", 1), ("Vandalism", 1)]
        );
    }

    #[test]
    fn unknown_neighborhood_has_no_offenses() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        assert!(top_offenses(&counts, Some("Nowhere"), 10).is_empty());
    }

    #[test]
    fn filtering_first_matches_restricting_after() {
        let reports = vec![
            Report::new("A", "Theft"),
            Report::new("B", "Theft"),
            Report::new("A", "Arson"),
            Report::new("B", "Fraud"),
            Report::new("A", "Theft"),
        ];

        let global = count_by_offense_and_neighborhood(&reports);
        let restricted = top_offenses(&global, Some("A"), 10);

        let filter = FilterContext::default().with_neighborhood("A");
        let filtered = count_by_offense_and_neighborhood(reports.iter().filter(|r| filter.matches(r)));
        let from_filtered = top_offenses(&filtered, None, 10);

        assert_eq!(restricted, from_filtered);
    }

    #[test]
    fn record_total_for_neighborhood() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        let total = record_total(&counts, Some("A")).unwrap();

        assert_eq!(total.total, 3);
        assert!((total.average - 2.0).abs() < f64::EPSILON);
        assert!((total.percent_delta - 50.0).abs() < 1e-9);
    }

    #[test]
    fn record_total_without_filter_compares_grand_total_to_average() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        let total = record_total(&counts, None).unwrap();

        assert_eq!(total.total, 4);
        assert!((total.percent_delta - 100.0).abs() < 1e-9);
    }

    #[test]
    fn record_total_for_missing_neighborhood_is_zero() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        let total = record_total(&counts, Some("Nowhere")).unwrap();

        assert_eq!(total.total, 0);
        assert!((total.percent_delta + 100.0).abs() < 1e-9);
    }

    #[test]
    fn record_total_on_empty_counts_is_division_by_zero() {
        let err = record_total(&OffenseNeighborhoodCounts::new(), None).unwrap_err();
        assert!(matches!(err, AnalyticsError::DivisionByZero { .. }));
    }

    #[test]
    fn ranks_neighborhoods_busiest_first() {
        let counts = count_by_offense_and_neighborhood(&example_reports());
        assert_eq!(neighborhood_rank(&counts, "A"), Some(1));
        assert_eq!(neighborhood_rank(&counts, "B"), Some(2));
        assert_eq!(neighborhood_rank(&counts, "Nowhere"), None);
    }

    #[test]
    fn ranks_form_a_bijection() {
        let reports = vec![
            Report::new("Pearl", "Theft"),
            Report::new("Buckman", "Theft"),
            Report::new("Hazelwood", "Theft"),
            Report::new("Pearl", "Arson"),
            Report::new("Lents", "Fraud"),
        ];
        let counts = count_by_offense_and_neighborhood(&reports);
        let names = count_by_neighborhood(&reports);

        let mut ranks: Vec<usize> = names
            .keys()
            .map(|n| neighborhood_rank(&counts, n).unwrap())
            .collect();
        ranks.sort_unstable();

        assert_eq!(ranks, (1..=names.len()).collect::<Vec<_>>());
    }

    #[test]
    fn average_per_day_uses_configured_span() {
        let mut counts = OffenseNeighborhoodCounts::new();
        counts.add("A", "Theft", 10);

        let avg = average_per_day(&counts, 2).unwrap();
        assert_eq!(format!("{avg:.2}"), "5.00");
        assert!(average_per_day(&counts, 0).is_err());
    }

    #[test]
    fn buckets_by_hour() {
        let reports = vec![
            timed("A", "Theft", None, "930"),
            timed("A", "Theft", None, "0915"),
            timed("A", "Arson", None, "2300"),
            timed("B", "Theft", None, "0900"),
            timed("A", "Theft", None, "2575"),
            Report::new("A", "Theft"),
        ];

        let all = bucket_by_hour(&reports, &FilterContext::default());
        assert_eq!(all.len(), 24);
        assert_eq!(all[9].count, 3);
        assert_eq!(all[23].count, 1);
        assert_eq!(all.iter().map(|h| h.count).sum::<u64>(), 4);

        let filter = FilterContext::default()
            .with_neighborhood("A")
            .with_offense_types(["Theft"]);
        let scoped = bucket_by_hour(&reports, &filter);
        assert_eq!(scoped[9].count, 2);
        assert_eq!(scoped[23].count, 0);
    }

    #[test]
    fn buckets_by_month_skipping_missing_dates() {
        let reports = vec![
            timed("A", "Theft", Some((2022, 3, 1)), "0"),
            timed("A", "Theft", Some((2022, 3, 9)), "0"),
            timed("A", "Theft", Some((2023, 1, 9)), "0"),
            timed("A", "Theft", Some((2022, 7, 4)), "0"),
            timed("B", "Theft", Some((2022, 7, 4)), "0"),
            timed("A", "Theft", None, "0"),
        ];

        let months = bucket_by_month(&reports, &FilterContext::default(), 12);
        let pairs: Vec<(&str, u64)> = months.iter().map(|m| (m.month.as_str(), m.count)).collect();
        assert_eq!(pairs, vec![("March", 2), ("July", 2), ("January", 1)]);

        let filter = FilterContext::default().with_neighborhood("A");
        let limited = bucket_by_month(&reports, &filter, 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].month, "March");
    }

    #[test]
    fn heatmap_is_dense_and_limited() {
        let reports = vec![
            Report::new("A", "Theft"),
            Report::new("A", "Theft"),
            Report::new("A", "Arson"),
            Report::new("B", "Theft"),
            Report::new("C", "Fraud"),
        ];
        let counts = count_by_offense_and_neighborhood(&reports);

        let matrix = heatmap_matrix(&counts, 2, 2);
        assert_eq!(matrix.neighborhoods, vec!["A", "B"]);
        assert_eq!(matrix.offense_types, vec!["Theft", "Arson"]);
        assert_eq!(matrix.cells, vec![vec![2, 1], vec![1, 0]]);
    }

    #[test]
    fn collects_filter_choices() {
        let mut reports = example_reports();
        reports[0].crime_against = Some(pdx_crime_report_models::CrimeAgainst::Property);
        reports.push(Report::new("C", ""));

        let choices = filter_choices(&reports);
        assert_eq!(choices.neighborhoods, vec!["A", "B", "C"]);
        assert_eq!(choices.offense_types, vec!["Assault", "Theft"]);
        assert_eq!(choices.crime_against.len(), 1);
    }

    #[test]
    fn neighborhood_table_sorted_descending() {
        let table = neighborhood_table(&count_by_neighborhood(&example_reports()));
        assert_eq!(table[0].neighborhood, "A");
        assert_eq!(table[0].count, 3);
        assert_eq!(table[1].neighborhood, "B");
    }
}
