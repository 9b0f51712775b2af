#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the Portland crime dashboard.
//!
//! Every dashboard aggregate is available as a subcommand, printed as a
//! terminal table or, with `--json`, as the same JSON the API serves.
//! Running without a subcommand opens an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`pdx_crime_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the loading spinner never fight for the terminal.

mod commands;
mod interactive;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pdx_crime_analytics_models::FilterContext;
use pdx_crime_cli_utils::IndicatifProgress;
use pdx_crime_config::DashboardConfig;
use pdx_crime_ingest::load_dataset;
use pdx_crime_report_models::CrimeAgainst;

#[derive(Parser)]
#[command(name = "pdx_crime", about = "Portland crime dashboard aggregates")]
struct Cli {
    /// Config file (defaults to `PDX_CRIME_CONFIG`, then `pdx_crime.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Tab-separated report export
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Neighborhood boundary `GeoJSON`
    #[arg(long, global = true)]
    boundaries: Option<PathBuf>,
    /// Run without neighborhood boundaries (disables map output)
    #[arg(long, global = true, conflicts_with = "boundaries")]
    no_boundaries: bool,
    /// Calendar days the export covers, for the per-day average
    #[arg(long, global = true)]
    day_span: Option<u32>,
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(flatten)]
    filter: FilterArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Dashboard filter selection.
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Neighborhood selected on the map
    #[arg(long, global = true)]
    neighborhood: Option<String>,
    /// Offense type to include (repeatable)
    #[arg(long = "offense", global = true)]
    offenses: Vec<String>,
    /// Crime-against category (Person, Property, Society)
    #[arg(long, global = true, value_parser = parse_crime_against)]
    crime_against: Option<CrimeAgainst>,
    /// Row limit for ranked output
    #[arg(long, global = true)]
    limit: Option<usize>,
}

fn parse_crime_against(value: &str) -> Result<CrimeAgainst, String> {
    value
        .parse()
        .map_err(|_| format!("expected one of Person, Property, Society, got {value:?}"))
}

impl FilterArgs {
    fn context(&self) -> FilterContext {
        FilterContext::default()
            .with_neighborhood(self.neighborhood.clone().unwrap_or_default())
            .with_offense_types(self.offenses.iter().cloned())
            .with_crime_against(self.crime_against)
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Every aggregate for one dashboard pass
    Summary,
    /// Report counts per neighborhood
    Neighborhoods,
    /// Most frequent offense types
    TopOffenses,
    /// Record total and its deviation from the neighborhood average
    Total,
    /// Rank of the selected neighborhood
    Rank,
    /// Average reports per day over the configured day span
    AveragePerDay,
    /// Reports by hour of day
    Hours,
    /// Busiest months
    Months,
    /// Neighborhood by offense matrix
    Heatmap {
        /// Heatmap rows (neighborhoods)
        #[arg(long)]
        rows: Option<usize>,
        /// Heatmap columns (offense types)
        #[arg(long)]
        columns: Option<usize>,
    },
    /// Sidebar filter choices
    Filters,
    /// Write neighborhood boundaries annotated with report counts
    Map {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Neighborhood containing a point
    Lookup {
        /// Longitude
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Latitude
        #[arg(allow_negative_numbers = true)]
        lat: f64,
    },
    /// Start the JSON API server
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Front-end files served at `/`
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pdx_crime_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(boundaries) = cli.boundaries {
        config.boundaries_path = Some(boundaries);
    }
    if cli.no_boundaries {
        config.boundaries_path = None;
    }
    if cli.day_span.is_some() {
        config.total_day_span = cli.day_span;
    }

    let progress = IndicatifProgress::file_bar(&multi, "Loading reports");
    let dataset = load_dataset(&config.data_path, &progress)?;

    let (command, filter) = match cli.command {
        Some(command) => (command, cli.filter),
        None => interactive::prompt(&dataset, cli.filter)?,
    };

    let session = commands::Session {
        config,
        json: cli.json,
        dataset,
    };

    commands::run(command, &filter, session)
}
