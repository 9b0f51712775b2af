#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone binary for the crime dashboard API server.
//!
//! Configuration comes from `pdx_crime.toml` (or `PDX_CRIME_CONFIG`) plus
//! the usual environment overrides. Pass `--interactive` to be prompted
//! for the bind address and port instead.

use pdx_crime_config::DashboardConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::load(None).map_err(|e| {
        log::error!("{e}");
        std::io::Error::other(e.to_string())
    })?;

    if std::env::args().skip(1).any(|arg| arg == "--interactive") {
        return pdx_crime_server::interactive::run(config).await;
    }

    pdx_crime_server::run_server(config).await
}
