//! Interactive mode for the server.
//!
//! Asks where to listen and which defaults to serve before starting.

use dialoguer::{Confirm, Input, Select};
use dissident_pipeline::{Metric, PipelineConfig};

const METRICS: &[Metric] = &[Metric::Plain, Metric::Dissident];

/// Prompts for listen address, default metric and page cap, then runs the
/// server.
///
/// The address is handed to [`super::run_server`] through `BIND_ADDR` and
/// `PORT`. A closed or non-interactive terminal falls back to the current
/// values.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the chosen settings are invalid or
/// the underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: PipelineConfig) -> std::io::Result<()> {
    println!("Dissident Score Server");
    println!();

    let (current_addr, current_port) = super::bind_address();

    let bind_addr: String = Input::new()
        .with_prompt("Listen on address")
        .default(current_addr.clone())
        .interact_text()
        .unwrap_or(current_addr);

    let port: u16 = Input::new()
        .with_prompt("Listen on port")
        .default(current_port)
        .interact_text()
        .unwrap_or(current_port);

    let labels: Vec<String> = METRICS.iter().map(ToString::to_string).collect();
    let current_metric = METRICS
        .iter()
        .position(|m| *m == config.metric)
        .unwrap_or(0);
    let metric_idx = Select::new()
        .with_prompt("Metric when a request names none")
        .items(&labels)
        .default(current_metric)
        .interact()
        .unwrap_or(current_metric);
    config.metric = METRICS[metric_idx];

    config.max_pages = Input::new()
        .with_prompt("Most listing pages per scrape")
        .default(config.max_pages)
        .interact_text()
        .unwrap_or(config.max_pages);

    config.validate().map_err(std::io::Error::other)?;

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", port.to_string());
    }

    if !Confirm::new()
        .with_prompt(format!(
            "Serve {} scrapes on {bind_addr}:{port}?",
            config.metric
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
