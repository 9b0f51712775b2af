//! Subcommand execution.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use pdx_crime_analytics::{
    bucket_by_hour, bucket_by_month, count_by_neighborhood, count_by_offense_and_neighborhood,
    filter_choices, heatmap_matrix, neighborhood_rank, neighborhood_table, record_total,
    summarize,
};
use pdx_crime_analytics_models::{FilterContext, OffenseNeighborhoodCounts};
use pdx_crime_config::DashboardConfig;
use pdx_crime_geography::Boundaries;
use pdx_crime_ingest::Dataset;
use pdx_crime_server::AppState;
use pdx_crime_server_models::{ApiAveragePerDay, ApiLookup, ApiRank};
use serde::Serialize;

use crate::{Commands, FilterArgs, render};

/// Everything a subcommand needs.
pub struct Session {
    pub config: DashboardConfig,
    pub json: bool,
    pub dataset: Dataset,
}

impl Session {
    fn scoped_counts(&self, filter: &FilterContext) -> OffenseNeighborhoodCounts {
        count_by_offense_and_neighborhood(
            self.dataset.reports.iter().filter(|r| filter.matches_scope(r)),
        )
    }

    fn boundaries(&self) -> Result<Boundaries, Box<dyn std::error::Error>> {
        let path = self
            .config
            .boundaries_path
            .as_deref()
            .ok_or("No boundary file configured (use --boundaries)")?;
        Ok(Boundaries::from_path(path)?)
    }

    /// Writes `value` as pretty JSON, or through `text` as a table.
    fn emit<T, F>(
        &self,
        out: &mut dyn Write,
        value: &T,
        text: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        T: Serialize,
        F: FnOnce(&mut dyn Write, &T) -> io::Result<()>,
    {
        if self.json {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        } else {
            text(out, value)?;
        }
        Ok(())
    }
}

/// Runs one subcommand against the loaded dataset, printing to stdout.
///
/// # Errors
///
/// Returns an error if an aggregate cannot be computed, the boundary file
/// cannot be loaded, or output cannot be written.
pub fn run(
    command: Commands,
    args: &FilterArgs,
    session: Session,
) -> Result<(), Box<dyn std::error::Error>> {
    run_to(command, args, session, &mut io::stdout().lock())
}

#[allow(clippy::too_many_lines)]
fn run_to(
    command: Commands,
    args: &FilterArgs,
    mut session: Session,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = args.context();
    let options = session.config.summary_options();

    match command {
        Commands::Summary => {
            let mut options = options;
            if let Some(limit) = args.limit {
                options.top_offenses = limit;
            }
            let summary = summarize(&session.dataset.reports, &filter, &options)?;
            session.emit(out, &summary, render::summary)?;
        }
        Commands::Neighborhoods => {
            let counts = count_by_neighborhood(
                session
                    .dataset
                    .reports
                    .iter()
                    .filter(|r| filter.matches_scope(r)),
            );
            let mut table = neighborhood_table(&counts);
            if let Some(limit) = args.limit {
                table.truncate(limit);
            }
            session.emit(out, &table, |out, rows| render::neighborhoods(out, rows))?;
        }
        Commands::TopOffenses => {
            let counts = session.scoped_counts(&filter);
            let limit = args.limit.unwrap_or(options.top_offenses);
            let top = pdx_crime_analytics::top_offenses(&counts, filter.neighborhood(), limit);
            session.emit(out, &top, |out, rows| render::offenses(out, rows))?;
        }
        Commands::Total => {
            let counts = session.scoped_counts(&filter);
            let total = record_total(&counts, filter.neighborhood())?;
            session.emit(out, &total, render::record_total)?;
        }
        Commands::Rank => {
            let counts = session.scoped_counts(&filter);
            let neighborhood = filter.neighborhood();
            let rank = ApiRank {
                neighborhood: neighborhood.map(str::to_string),
                rank: neighborhood.and_then(|n| neighborhood_rank(&counts, n)),
                out_of: counts.neighborhood_totals().len(),
            };
            session.emit(out, &rank, |out, rank| render::rank(out, rank.rank, rank.out_of))?;
        }
        Commands::AveragePerDay => {
            let average = match options.total_day_span {
                Some(total_day_span) => {
                    let counts = session.scoped_counts(&filter);
                    Some(ApiAveragePerDay {
                        average_per_day: pdx_crime_analytics::average_per_day(
                            &counts,
                            total_day_span,
                        )?,
                        total_day_span,
                    })
                }
                None => {
                    log::warn!("total_day_span is not configured (use --day-span)");
                    None
                }
            };
            session.emit(out, &average, |out, average| {
                render::average_per_day(out, average.map(|a| a.average_per_day))
            })?;
        }
        Commands::Hours => {
            let hours = bucket_by_hour(&session.dataset.reports, &filter);
            session.emit(out, &hours, |out, rows| render::hours(out, rows))?;
        }
        Commands::Months => {
            let limit = args.limit.unwrap_or(options.months);
            let months = bucket_by_month(&session.dataset.reports, &filter, limit);
            session.emit(out, &months, |out, rows| render::months(out, rows))?;
        }
        Commands::Heatmap { rows, columns } => {
            let counts = session.scoped_counts(&filter);
            let matrix = heatmap_matrix(
                &counts,
                rows.unwrap_or(options.heatmap_neighborhoods),
                columns.unwrap_or(options.heatmap_offenses),
            );
            session.emit(out, &matrix, render::heatmap)?;
        }
        Commands::Filters => {
            let choices = filter_choices(&session.dataset.reports);
            session.emit(out, &choices, render::filters)?;
        }
        Commands::Map { output } => {
            let boundaries = session.boundaries()?;
            let counts = count_by_neighborhood(
                session
                    .dataset
                    .reports
                    .iter()
                    .filter(|r| filter.matches_scope(r)),
            );
            let unmatched = boundaries.unmatched(&counts);
            if !unmatched.is_empty() {
                log::warn!(
                    "{} neighborhoods have reports but no boundary: {}",
                    unmatched.len(),
                    unmatched.join(", ")
                );
            }

            let annotated = boundaries.annotate(&counts);
            if let Some(path) = output {
                let mut writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer(&mut writer, &annotated)?;
                writer.flush()?;
                log::info!(
                    "Wrote {} annotated boundaries to {}",
                    annotated.features.len(),
                    path.display()
                );
            } else {
                serde_json::to_writer_pretty(&mut *out, &annotated)?;
                writeln!(out)?;
            }
        }
        Commands::Lookup { lng, lat } => {
            let boundaries = session.boundaries()?;
            let lookup = ApiLookup {
                neighborhood: boundaries.lookup(lng, lat).map(str::to_string),
            };
            session.emit(out, &lookup, |out, lookup| {
                writeln!(out, "{}", lookup.neighborhood.as_deref().unwrap_or("n/a"))
            })?;
        }
        Commands::Serve {
            bind,
            port,
            static_dir,
        } => {
            if let Some(bind) = bind {
                session.config.server.bind_addr = bind;
            }
            if let Some(port) = port {
                session.config.server.port = port;
            }
            if static_dir.is_some() {
                session.config.server.static_dir = static_dir;
            }

            let state = AppState::from_dataset(&session.config, session.dataset)?;
            actix_web::rt::System::new()
                .block_on(pdx_crime_server::serve(session.config, state))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pdx_crime_analytics_models::{NeighborhoodCount, OffenseCount};
    use pdx_crime_report_models::Report;

    use super::*;

    fn session(json: bool, total_day_span: Option<u32>) -> Session {
        let config = DashboardConfig {
            total_day_span,
            ..DashboardConfig::default()
        };
        let dataset = Dataset::from_reports(vec![
            Report::new("Pearl", "Theft"),
            Report::new("Pearl", "Theft"),
            Report::new("Pearl", "Vandalism"),
            Report::new("Buckman", "Theft"),
        ]);
        Session {
            config,
            json,
            dataset,
        }
    }

    fn output(command: Commands, args: &FilterArgs, session: Session) -> String {
        let mut buf = Vec::new();
        run_to(command, args, session, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn neighborhoods_json_is_truncated_to_limit() {
        let args = FilterArgs {
            limit: Some(1),
            ..FilterArgs::default()
        };
        let text = output(Commands::Neighborhoods, &args, session(true, None));
        let rows: Vec<NeighborhoodCount> = serde_json::from_str(&text).unwrap();

        assert_eq!(
            rows,
            vec![NeighborhoodCount {
                neighborhood: "Pearl".to_string(),
                count: 3,
            }]
        );
    }

    #[test]
    fn top_offenses_json_for_selected_neighborhood() {
        let args = FilterArgs {
            neighborhood: Some("Buckman".to_string()),
            ..FilterArgs::default()
        };
        let text = output(Commands::TopOffenses, &args, session(true, None));
        let rows: Vec<OffenseCount> = serde_json::from_str(&text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].offense_type, "Theft");
        assert_eq!(rows[0].count, 1);
    }

    #[test]
    fn average_per_day_without_span_prints_na() {
        let args = FilterArgs::default();

        let text = output(Commands::AveragePerDay, &args, session(false, None));
        assert_eq!(text, "Average per day: n/a\n");

        let text = output(Commands::AveragePerDay, &args, session(true, None));
        assert_eq!(text.trim(), "null");
    }

    #[test]
    fn average_per_day_with_span() {
        let text = output(
            Commands::AveragePerDay,
            &FilterArgs::default(),
            session(false, Some(2)),
        );
        assert_eq!(text, "Average per day: 2.00\n");
    }

    #[test]
    fn rank_prints_position_in_text_mode() {
        let args = FilterArgs {
            neighborhood: Some("Buckman".to_string()),
            ..FilterArgs::default()
        };
        let text = output(Commands::Rank, &args, session(false, None));
        assert_eq!(text, "Rank: 2 of 2\n");
    }

    #[test]
    fn map_without_boundaries_is_an_error() {
        let mut buf = Vec::new();
        let result = run_to(
            Commands::Map { output: None },
            &FilterArgs::default(),
            session(true, None),
            &mut buf,
        );
        assert!(result.is_err());
        assert!(buf.is_empty());
    }
}
