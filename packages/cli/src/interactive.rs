//! Prompts for the interactive menu.

use dialoguer::{Confirm, Input, Select};
use dissident_cli_utils::MultiProgress;
use dissident_pipeline::{Metric, PipelineConfig};

use crate::commands;

const METRICS: &[Metric] = &[Metric::Plain, Metric::Dissident];

/// Asks for a Letterboxd username.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails.
pub fn username() -> Result<String, dialoguer::Error> {
    Input::new().with_prompt("Letterboxd username").interact_text()
}

/// Prompts for scrape options, then runs the scrape.
pub async fn scrape(
    multi: &MultiProgress,
    config: PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = username()?;

    let labels: Vec<String> = METRICS.iter().map(ToString::to_string).collect();
    let default_metric = METRICS
        .iter()
        .position(|m| *m == config.metric)
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Metric")
        .items(&labels)
        .default(default_metric)
        .interact()?;

    let samples: String = Input::new()
        .with_prompt("Samples (all, none, or a comma-separated list)")
        .default("none".to_string())
        .interact_text()?;

    let simple = Confirm::new()
        .with_prompt("Print films as name/rating pairs only?")
        .default(false)
        .interact()?;

    let config = commands::with_overrides(config, Some(METRICS[idx]), Some(samples.as_str()))?;
    commands::scrape(multi, config, &username, simple).await
}
