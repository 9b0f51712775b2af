#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web JSON API for the Portland crime dashboard.
//!
//! Loads the report export and neighborhood boundaries once at startup
//! and serves every dashboard aggregate under `/api`. Each request parses
//! its own filter selection from the query string and recomputes the
//! aggregate from the shared, read-only dataset. A pre-built front end can
//! optionally be served from a static directory at `/`.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use pdx_crime_analytics::count_by_neighborhood;
use pdx_crime_analytics_models::SummaryOptions;
use pdx_crime_config::DashboardConfig;
use pdx_crime_geography::{Boundaries, GeographyError};
use pdx_crime_ingest::progress::{ProgressCallback, null_progress};
use pdx_crime_ingest::{Dataset, load_dataset};

/// Shared application state.
pub struct AppState {
    /// Clean reports, loaded once.
    pub dataset: Arc<Dataset>,
    /// Neighborhood boundaries, when a boundary file is configured.
    pub boundaries: Option<Arc<Boundaries>>,
    /// Default limits and the configured day span.
    pub options: SummaryOptions,
}

impl AppState {
    /// Builds state from already-loaded data.
    #[must_use]
    pub fn new(dataset: Dataset, boundaries: Option<Boundaries>, options: SummaryOptions) -> Self {
        Self {
            dataset: Arc::new(dataset),
            boundaries: boundaries.map(Arc::new),
            options,
        }
    }

    /// Loads the export and boundary file named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the export or the boundary file cannot be
    /// loaded.
    pub fn load(
        config: &DashboardConfig,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let dataset = load_dataset(&config.data_path, progress)?;
        Ok(Self::from_dataset(config, dataset)?)
    }

    /// Builds state around an already-loaded export, loading the boundary
    /// file named by `config`.
    ///
    /// Neighborhoods that have reports but no boundary feature are logged
    /// as a warning, since the map cannot draw them.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the boundary file cannot be loaded.
    pub fn from_dataset(config: &DashboardConfig, dataset: Dataset) -> Result<Self, GeographyError> {
        let boundaries = config
            .boundaries_path
            .as_deref()
            .map(Boundaries::from_path)
            .transpose()?;

        if let Some(boundaries) = &boundaries {
            let unmatched = boundaries.unmatched(&count_by_neighborhood(&dataset.reports));
            if !unmatched.is_empty() {
                log::warn!(
                    "{} neighborhoods have reports but no boundary: {}",
                    unmatched.len(),
                    unmatched.join(", ")
                );
            }
        }

        Ok(Self::new(dataset, boundaries, config.summary_options()))
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/filters", web::get().to(handlers::filters))
            .route("/summary", web::get().to(handlers::summary))
            .route("/neighborhoods", web::get().to(handlers::neighborhoods))
            .route("/offenses/top", web::get().to(handlers::top_offenses))
            .route("/total", web::get().to(handlers::total))
            .route("/rank", web::get().to(handlers::rank))
            .route("/average-per-day", web::get().to(handlers::average_per_day))
            .route("/hours", web::get().to(handlers::hours))
            .route("/months", web::get().to(handlers::months))
            .route("/heatmap", web::get().to(handlers::heatmap))
            .route("/map", web::get().to(handlers::map))
            .route("/map/lookup", web::get().to(handlers::map_lookup)),
    );
}

/// Starts the dashboard API server.
///
/// Loads the dataset and boundaries named by `config`, then serves until
/// shut down. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`) and is responsible for initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the data cannot be loaded, or
/// the HTTP server fails to bind or encounters a runtime error.
pub async fn run_server(config: DashboardConfig) -> std::io::Result<()> {
    let state = AppState::load(&config, &null_progress())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    serve(config, state).await
}

/// Serves already-loaded state.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn serve(config: DashboardConfig, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let static_dir = config.server.static_dir.clone();
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        // Serve frontend static files (production)
        if let Some(dir) = &static_dir {
            app = app.service(Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
