//! Interactive mode for the server.
//!
//! Prompts the user for data files, bind address and port before starting
//! the server.

use dialoguer::{Confirm, Input};
use pdx_crime_config::DashboardConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Each prompt defaults to the value already in `config`, so pressing
/// enter throughout starts the server exactly as configured.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the data cannot be loaded or the
/// underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: DashboardConfig) -> std::io::Result<()> {
    println!("Portland Crime Dashboard Server");
    println!();

    let data_path: String = Input::new()
        .with_prompt("Report export")
        .default(config.data_path.display().to_string())
        .interact_text()
        .unwrap_or_else(|_| config.data_path.display().to_string());
    config.data_path = data_path.into();

    config.server.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.server.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| config.server.bind_addr.clone());

    config.server.port = Input::new()
        .with_prompt("Port")
        .default(config.server.port)
        .interact_text()
        .unwrap_or(config.server.port);

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.server.bind_addr, config.server.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
