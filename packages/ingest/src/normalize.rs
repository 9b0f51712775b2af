//! Cleans [`RawReport`] rows into [`Report`] values.
//!
//! Rows without a neighborhood are dropped outright. Dates and times that
//! fail to parse are kept as `None` on the row, so the report still counts
//! toward neighborhood and offense totals but is left out of the
//! time-bucketed aggregates that need the missing field.

use chrono::NaiveDate;
use pdx_crime_report_models::{CrimeAgainst, OccurTime, RawReport, Report};
use serde::Serialize;

/// Date formats seen in the export, tried in order.
///
/// `%y` must come before `%Y`: chrono's `%Y` happily reads `22` as the
/// year 22.
const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// Counters collected while normalizing a batch of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeStats {
    /// Raw rows handed to the normalizer.
    pub rows_read: u64,
    /// Rows removed because the neighborhood was absent or blank.
    pub dropped_blank_neighborhood: u64,
    /// Kept rows whose date was present but unparseable.
    pub unparseable_dates: u64,
    /// Kept rows whose time was present but unparseable.
    pub unparseable_times: u64,
}

impl NormalizeStats {
    /// Number of rows that survived normalization.
    #[must_use]
    pub const fn rows_kept(&self) -> u64 {
        self.rows_read - self.dropped_blank_neighborhood
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Clean rows, in input order.
    pub reports: Vec<Report>,
    /// What was dropped or degraded along the way.
    pub stats: NormalizeStats,
}

/// Normalizes raw rows.
///
/// Never fails: malformed values degrade to `None` and are tallied in
/// [`NormalizeStats`]. A single warning is logged when any dates or times
/// could not be parsed.
#[must_use]
pub fn normalize<I>(rows: I) -> Normalized
where
    I: IntoIterator<Item = RawReport>,
{
    let mut stats = NormalizeStats::default();
    let mut reports = Vec::new();

    for raw in rows {
        stats.rows_read += 1;

        let Some(neighborhood) = non_blank(raw.neighborhood.as_deref()) else {
            stats.dropped_blank_neighborhood += 1;
            continue;
        };

        let occur_date = non_blank(raw.occur_date.as_deref()).and_then(|s| {
            let date = parse_occur_date(s);
            if date.is_none() {
                stats.unparseable_dates += 1;
            }
            date
        });

        let occur_time = non_blank(raw.occur_time.as_deref()).and_then(|s| {
            let time = OccurTime::from_code(s);
            if time.is_none() {
                stats.unparseable_times += 1;
            }
            time
        });

        let crime_against = non_blank(raw.crime_against.as_deref()).and_then(|s| {
            s.parse::<CrimeAgainst>()
                .inspect_err(|_| log::debug!("Unrecognised CrimeAgainst value {s:?}"))
                .ok()
        });

        reports.push(Report {
            neighborhood: neighborhood.to_string(),
            offense_type: raw.offense_type.as_deref().map_or("", str::trim).to_string(),
            crime_against,
            occur_date,
            occur_time,
        });
    }

    if stats.unparseable_dates > 0 || stats.unparseable_times > 0 {
        log::warn!(
            "{} rows have unparseable dates and {} rows have unparseable times; \
             they are excluded from date/time charts only",
            stats.unparseable_dates,
            stats.unparseable_times,
        );
    }

    log::debug!(
        "Normalized {} rows ({} dropped for blank neighborhood)",
        stats.rows_read,
        stats.dropped_blank_neighborhood
    );

    Normalized { reports, stats }
}

/// Parses an `OccurDate` value using the known export formats.
#[must_use]
pub fn parse_occur_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(neighborhood: Option<&str>, date: Option<&str>, time: Option<&str>) -> RawReport {
        RawReport {
            neighborhood: neighborhood.map(String::from),
            offense_type: Some("Shoplifting".to_string()),
            crime_against: Some("Property".to_string()),
            occur_date: date.map(String::from),
            occur_time: time.map(String::from),
        }
    }

    #[test]
    fn drops_absent_and_blank_neighborhoods() {
        let out = normalize(vec![
            raw(Some("Pearl"), None, None),
            raw(None, None, None),
            raw(Some(""), None, None),
            raw(Some("   "), None, None),
        ]);

        assert_eq!(out.reports.len(), 1);
        assert_eq!(out.stats.rows_read, 4);
        assert_eq!(out.stats.dropped_blank_neighborhood, 3);
        assert_eq!(out.stats.rows_kept(), 1);
        assert!(out.reports.iter().all(|r| !r.neighborhood.trim().is_empty()));
    }

    #[test]
    fn trims_neighborhood_names() {
        let out = normalize(vec![raw(Some("  Hazelwood "), None, None)]);
        assert_eq!(out.reports[0].neighborhood, "Hazelwood");
    }

    #[test]
    fn formats_times_as_hh_mm() {
        let out = normalize(vec![
            raw(Some("Pearl"), None, Some("930")),
            raw(Some("Pearl"), None, Some("2575")),
            raw(Some("Pearl"), None, Some("0")),
        ]);

        let times: Vec<&str> = out
            .reports
            .iter()
            .map(|r| r.occur_time.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(times, vec!["09:30", "25:75", "00:00"]);
    }

    #[test]
    fn keeps_rows_with_bad_dates_and_times() {
        let out = normalize(vec![raw(Some("Pearl"), Some("13/45/2022"), Some("abc"))]);

        assert_eq!(out.reports.len(), 1);
        assert!(out.reports[0].occur_date.is_none());
        assert!(out.reports[0].occur_time.is_none());
        assert_eq!(out.stats.unparseable_dates, 1);
        assert_eq!(out.stats.unparseable_times, 1);
    }

    #[test]
    fn missing_values_are_not_counted_as_unparseable() {
        let out = normalize(vec![raw(Some("Pearl"), None, None)]);
        assert_eq!(out.stats.unparseable_dates, 0);
        assert_eq!(out.stats.unparseable_times, 0);
    }

    #[test]
    fn parses_known_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2022, 3, 7).unwrap();
        assert_eq!(parse_occur_date("3/7/2022"), Some(expected));
        assert_eq!(parse_occur_date("03/07/2022"), Some(expected));
        assert_eq!(parse_occur_date("2022-03-07"), Some(expected));
        assert_eq!(parse_occur_date("3/7/22"), Some(expected));
        assert_eq!(parse_occur_date("yesterday"), None);
    }

    #[test]
    fn parses_crime_against() {
        let mut row = raw(Some("Pearl"), None, None);
        row.crime_against = Some("person".to_string());
        let out = normalize(vec![row]);
        assert_eq!(out.reports[0].crime_against, Some(CrimeAgainst::Person));

        let mut row = raw(Some("Pearl"), None, None);
        row.crime_against = Some("Unknown".to_string());
        let out = normalize(vec![row]);
        assert_eq!(out.reports[0].crime_against, None);
    }
}
