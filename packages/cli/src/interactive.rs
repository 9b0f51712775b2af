//! Interactive mode: pick an aggregate and a filter selection from menus.

use dialoguer::{Input, Select};
use pdx_crime_analytics::filter_choices;
use pdx_crime_ingest::Dataset;
use pdx_crime_report_models::CrimeAgainst;

use crate::{Commands, FilterArgs};

/// Top-level actions offered by the menu.
enum Action {
    Summary,
    Neighborhoods,
    TopOffenses,
    Hours,
    Months,
    Heatmap,
    Map,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Summary,
        Self::Neighborhoods,
        Self::TopOffenses,
        Self::Hours,
        Self::Months,
        Self::Heatmap,
        Self::Map,
        Self::Serve,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Dashboard summary",
            Self::Neighborhoods => "Reports per neighborhood",
            Self::TopOffenses => "Top offenses",
            Self::Hours => "Reports by hour of day",
            Self::Months => "Busiest months",
            Self::Heatmap => "Neighborhood heatmap",
            Self::Map => "Export annotated map",
            Self::Serve => "Start server",
        }
    }

    const fn filtered(&self) -> bool {
        !matches!(self, Self::Serve)
    }
}

/// Prompts for an action and, where it applies, a filter selection.
///
/// Filter flags already given on the command line are kept as the
/// starting point.
///
/// # Errors
///
/// Returns an error if the terminal prompts fail.
pub fn prompt(
    dataset: &Dataset,
    mut filter: FilterArgs,
) -> Result<(Commands, FilterArgs), Box<dyn std::error::Error>> {
    println!("Portland Crime Dashboard");
    println!("{} reports loaded", dataset.len());
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to see?")
        .items(&labels)
        .default(0)
        .interact()?;
    let action = &Action::ALL[idx];

    if action.filtered() {
        let choices = filter_choices(&dataset.reports);

        let mut neighborhoods = vec!["All neighborhoods"];
        neighborhoods.extend(choices.neighborhoods.iter().map(String::as_str));
        let selected = Select::new()
            .with_prompt("Neighborhood")
            .items(&neighborhoods)
            .default(0)
            .interact()?;
        if selected > 0 {
            filter.neighborhood = Some(neighborhoods[selected].to_string());
        }

        let mut categories = vec!["Any".to_string()];
        categories.extend(CrimeAgainst::all().iter().map(ToString::to_string));
        let selected = Select::new()
            .with_prompt("Crime against")
            .items(&categories)
            .default(0)
            .interact()?;
        if selected > 0 {
            filter.crime_against = Some(CrimeAgainst::all()[selected - 1]);
        }
    }

    let command = match action {
        Action::Summary => Commands::Summary,
        Action::Neighborhoods => Commands::Neighborhoods,
        Action::TopOffenses => Commands::TopOffenses,
        Action::Hours => Commands::Hours,
        Action::Months => Commands::Months,
        Action::Heatmap => Commands::Heatmap {
            rows: None,
            columns: None,
        },
        Action::Map => {
            let output: String = Input::new()
                .with_prompt("Output file")
                .default("neighborhoods.geojson".to_string())
                .interact_text()?;
            Commands::Map {
                output: Some(output.into()),
            }
        }
        Action::Serve => Commands::Serve {
            bind: None,
            port: None,
            static_dir: None,
        },
    };

    Ok((command, filter))
}
