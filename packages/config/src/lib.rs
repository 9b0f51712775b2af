#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard configuration.
//!
//! ## Loading order
//!
//! 1. An explicit path (the CLI `--config` flag)
//! 2. The `PDX_CRIME_CONFIG` environment variable
//! 3. `pdx_crime.toml` in the current working directory
//! 4. Built-in defaults
//!
//! When no boundary file is named, `portland.geojson` is used if it
//! exists in the working directory. Environment overrides
//! (`PDX_CRIME_DATA`, `PDX_CRIME_BOUNDARIES`, `PDX_CRIME_DAY_SPAN`,
//! `BIND_ADDR`, `PORT`) are applied on top of whichever file was used; an
//! empty `PDX_CRIME_BOUNDARIES` turns the map off.
//!
//! ```toml
//! data_path = "portland-crime-data.csv"
//! boundaries_path = "portland.geojson"
//! total_day_span = 365
//!
//! [limits]
//! top_offenses = 10
//!
//! [server]
//! port = 8080
//! ```

use std::path::{Path, PathBuf};

use pdx_crime_analytics_models::SummaryOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PDX_CRIME_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pdx_crime.toml";

/// Boundary file picked up from the working directory when none is named.
pub const DEFAULT_BOUNDARIES_FILE: &str = "portland.geojson";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`DashboardConfig`].
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for environment variable {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Tab-separated report export.
    pub data_path: PathBuf,
    /// Neighborhood boundary `GeoJSON`. The map endpoints are disabled
    /// when unset.
    pub boundaries_path: Option<PathBuf>,
    /// Calendar days the export covers, for the per-day average. Must be
    /// kept in step with the export; it is never derived from the data.
    pub total_day_span: Option<u32>,
    /// Row limits per visual.
    pub limits: Limits,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("portland-crime-data.csv"),
            boundaries_path: None,
            total_day_span: None,
            limits: Limits::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Row limits per visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Offense ranking table rows.
    pub top_offenses: usize,
    /// Month chart bars.
    pub months: usize,
    /// Heatmap rows.
    pub heatmap_neighborhoods: usize,
    /// Heatmap columns.
    pub heatmap_offenses: usize,
}

impl Default for Limits {
    fn default() -> Self {
        let defaults = SummaryOptions::default();
        Self {
            top_offenses: defaults.top_offenses,
            months: defaults.months,
            heatmap_neighborhoods: defaults.heatmap_neighborhoods,
            heatmap_offenses: defaults.heatmap_offenses,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Pre-built front-end files served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Loads configuration following the documented order, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a selected file cannot be read or
    /// parsed, or an override is malformed. A missing default
    /// `pdx_crime.toml` is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            });

        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_path(&path)?
            }
            None => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };

        config.use_default_boundaries_if_present(Path::new(DEFAULT_BOUNDARIES_FILE));
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses config from TOML text. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Points `boundaries_path` at `candidate` when no boundary file is
    /// configured and `candidate` exists.
    pub fn use_default_boundaries_if_present(&mut self, candidate: &Path) {
        if self.boundaries_path.is_none() && candidate.is_file() {
            log::debug!("Using boundary file {}", candidate.display());
            self.boundaries_path = Some(candidate.to_path_buf());
        }
    }

    /// Applies environment-style overrides from `lookup`.
    ///
    /// An empty `PDX_CRIME_BOUNDARIES` clears the boundary file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PDX_CRIME_DAY_SPAN` or
    /// `PORT` is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data) = lookup("PDX_CRIME_DATA") {
            self.data_path = PathBuf::from(data);
        }
        if let Some(boundaries) = lookup("PDX_CRIME_BOUNDARIES") {
            self.boundaries_path = if boundaries.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(boundaries))
            };
        }
        if let Some(span) = lookup("PDX_CRIME_DAY_SPAN") {
            self.total_day_span = Some(parse_env("PDX_CRIME_DAY_SPAN", span)?);
        }
        if let Some(bind_addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", port)?;
        }
        Ok(())
    }

    /// Aggregate options derived from this config.
    #[must_use]
    pub const fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            top_offenses: self.limits.top_offenses,
            months: self.limits.months,
            heatmap_neighborhoods: self.limits.heatmap_neighborhoods,
            heatmap_offenses: self.limits.heatmap_offenses,
            total_day_span: self.total_day_span,
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
